//! 密码哈希（bcrypt）

/// 计算密码哈希
pub fn hash_password(raw: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(raw, cost)
}

/// 校验密码；哈希格式损坏时按不匹配处理
pub fn verify_password(raw: &str, hashed: &str) -> bool {
    match bcrypt::verify(raw, hashed) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!("密码哈希校验失败: {}", e);
            false
        }
    }
}
