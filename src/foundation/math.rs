pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn gcd_u64(a: u64, b: u64) -> u64 {
    gcd_u128(u128::from(a), u128::from(b)) as u64
}

pub(crate) fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// `ceil(num / den)`; `den` must be non-zero.
pub(crate) fn ceil_div_u128(num: u128, den: u128) -> u128 {
    num / den + u128::from(num % den != 0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
