use crate::{effects::composite::over_solid_in_place, foundation::math::mul_div255_u8};

/// Lay a uniform `color` haze at opacity `amount / 255` over a premultiplied RGBA8 buffer.
///
/// Transparent pixels become fog-colored at that opacity; `amount == 0` is a no-op.
pub fn fog_in_place(rgba_premul: &mut [u8], color: [u8; 3], amount: u8) {
    if amount == 0 {
        return;
    }
    let a = u16::from(amount);
    let fog = [
        mul_div255_u8(u16::from(color[0]), a),
        mul_div255_u8(u16::from(color[1]), a),
        mul_div255_u8(u16::from(color[2]), a),
        amount,
    ];
    over_solid_in_place(rgba_premul, fog);
}

#[cfg(test)]
#[path = "../../tests/unit/effects/fog.rs"]
mod tests;
