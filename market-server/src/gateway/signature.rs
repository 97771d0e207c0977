//! Gateway Callback Signature
//!
//! 网关支付回调签名：HMAC-SHA256 over `"{gateway_order_id}|{gateway_payment_id}"`，
//! 密钥为服务端持有的网关私钥，十六进制编码。
//!
//! 验证失败属于安全相关拒绝：返回 400，记录日志，绝不静默重试。

use ring::hmac;

/// Compute the expected signature, hex-encoded
pub fn sign(gateway_order_id: &str, gateway_payment_id: &str, secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let payload = format!("{}|{}", gateway_order_id, gateway_payment_id);
    let tag = hmac::sign(&key, payload.as_bytes());
    hex::encode(tag.as_ref())
}

/// Verify a supplied hex signature (constant-time compare via ring)
///
/// 非法十六进制输入直接判为不匹配。
pub fn verify(
    gateway_order_id: &str,
    gateway_payment_id: &str,
    secret: &str,
    supplied_hex: &str,
) -> bool {
    let supplied = match hex::decode(supplied_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let payload = format!("{}|{}", gateway_order_id, gateway_payment_id);
    hmac::verify(&key, payload.as_bytes(), &supplied).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // HMAC-SHA256("o1|p1", "s3cr3t"), independently computed
    const KNOWN_SIGNATURE: &str =
        "cdbbfb93dee03d1dbc77488f549c1241f4c204ee48bb615bb5e08a879946a73e";

    #[test]
    fn test_sign_known_vector() {
        assert_eq!(sign("o1", "p1", "s3cr3t"), KNOWN_SIGNATURE);
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        assert!(verify("o1", "p1", "s3cr3t", KNOWN_SIGNATURE));
    }

    #[test]
    fn test_verify_rejects_other_hex() {
        let tampered = KNOWN_SIGNATURE.replace('c', "d");
        assert!(!verify("o1", "p1", "s3cr3t", &tampered));
        assert!(!verify("o1", "p1", "s3cr3t", &"00".repeat(32)));
    }

    #[test]
    fn test_verify_rejects_wrong_inputs() {
        assert!(!verify("o1", "p2", "s3cr3t", KNOWN_SIGNATURE));
        assert!(!verify("o2", "p1", "s3cr3t", KNOWN_SIGNATURE));
        assert!(!verify("o1", "p1", "other-secret", KNOWN_SIGNATURE));
    }

    #[test]
    fn test_verify_rejects_malformed_hex() {
        assert!(!verify("o1", "p1", "s3cr3t", "not-hex-at-all"));
        assert!(!verify("o1", "p1", "s3cr3t", ""));
    }
}
