use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LayercastError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(LayercastError::input("x").to_string().contains("input error:"));
    assert!(
        LayercastError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        LayercastError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LayercastError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
