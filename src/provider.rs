//! 兜底应答者的外部实现
pub mod openai;
