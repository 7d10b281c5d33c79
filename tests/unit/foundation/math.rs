use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn opacity_to_unit255_clamps_and_rounds() {
    assert_eq!(opacity_to_unit255(0.0), 0);
    assert_eq!(opacity_to_unit255(1.0), 255);
    assert_eq!(opacity_to_unit255(0.5), 128);
    assert_eq!(opacity_to_unit255(-3.0), 0);
    assert_eq!(opacity_to_unit255(7.0), 255);
    assert_eq!(opacity_to_unit255(f32::NAN), 0);
}
