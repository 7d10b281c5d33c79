use super::*;

#[test]
fn fog_amount_0_is_noop() {
    let mut px = vec![10u8, 20, 30, 255, 0, 0, 0, 0];
    let before = px.clone();
    fog_in_place(&mut px, [255, 255, 255], 0);
    assert_eq!(px, before);
}

#[test]
fn fog_tints_transparent_pixels_at_fog_opacity() {
    let mut px = vec![0u8, 0, 0, 0];
    fog_in_place(&mut px, [255, 255, 255], 100);
    assert_eq!(px, vec![100, 100, 100, 100]);
}

#[test]
fn fog_lightens_opaque_pixels_and_keeps_them_opaque() {
    let mut px = vec![0u8, 0, 0, 255];
    fog_in_place(&mut px, [255, 255, 255], 128);
    assert_eq!(px[3], 255);
    assert_eq!(px[0], 128);
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
}

#[test]
fn fog_full_amount_replaces_color() {
    let mut px = vec![9u8, 200, 40, 255];
    fog_in_place(&mut px, [30, 60, 90], 255);
    assert_eq!(px, vec![30, 60, 90, 255]);
}
