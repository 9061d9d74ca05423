use super::generate_validation;

#[test]
fn test_hash_is_deterministic() {
    let a = generate_validation(3, "/databases?session-id=42", 2, 7);
    let b = generate_validation(3, "/databases?session-id=42", 2, 7);
    assert_eq!(a, b);
}

#[test]
fn test_hash_is_fixed_length_hex() {
    let long = "/x".repeat(500);
    for uri in ["/", "/login", long.as_str()] {
        let hash = generate_validation(3, uri, 2, 1);
        assert_eq!(hash.len(), 32);
        assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(hash, hash.to_uppercase());
    }
}

#[test]
fn test_hash_varies_with_inputs() {
    let base = generate_validation(3, "/update?session-id=1", 2, 5);

    assert_ne!(base, generate_validation(3, "/update?session-id=2", 2, 5));
    assert_ne!(base, generate_validation(3, "/update?session-id=1", 3, 5));
    assert_ne!(base, generate_validation(3, "/update?session-id=1", 2, 6));
}

#[test]
fn test_v2_and_v3_differ() {
    let v2 = generate_validation(2, "/login", 2, 0);
    let v3 = generate_validation(3, "/login", 2, 0);
    assert_ne!(v2, v3);
}

#[test]
fn test_request_id_ignored_for_v2() {
    // v2 peers never mix in the sequence number
    let a = generate_validation(2, "/login", 2, 1);
    let b = generate_validation(2, "/login", 2, 99);
    assert_eq!(a, b);
}
