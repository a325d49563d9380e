//! 微信服务器请求的签名校验
use sha1::{Digest, Sha1};

/// 校验微信服务器的请求是否合规
///
/// 将token、timestamp、nonce三个参数按字典序排序后拼接，取SHA-1摘要的小写十六进制字符串，
/// 与signature比较。任一参数为空即视为校验失败。
pub fn check_signature(signature: &str, timestamp: &str, nonce: &str, token: &str) -> bool {
    if signature.is_empty() || timestamp.is_empty() || nonce.is_empty() {
        return false;
    }
    signature == generate_signature(timestamp, nonce, token)
}

/// 计算签名
pub fn generate_signature(timestamp: &str, nonce: &str, token: &str) -> String {
    let mut raw = [token, timestamp, nonce];
    raw.sort_unstable();
    let digest = Sha1::digest(raw.concat().as_bytes());
    base16ct::lower::encode_string(&digest)
}
