/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Short human-facing order reference: first 8 hex chars of the UUID,
/// uppercased. Shown in operator notifications and admin links.
pub fn short_order_ref(id: &uuid::Uuid) -> String {
    id.simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ref_is_eight_upper_hex() {
        let id = uuid::Uuid::new_v4();
        let r = short_order_ref(&id);
        assert_eq!(r.len(), 8);
        assert_eq!(r, r.to_uppercase());
    }
}
