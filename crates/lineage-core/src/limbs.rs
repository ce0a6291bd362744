//! Little-endian `u64` limb arithmetic shared by the unbounded number types.
//!
//! Every function takes and returns trimmed limbs: no most-significant zero
//! limb, and zero is the empty slice.

use std::cmp::Ordering;

/// 10^19, the largest power of ten that fits in a `u64`.
const DECIMAL_CHUNK: u64 = 10_000_000_000_000_000_000;
pub(crate) const DECIMAL_CHUNK_DIGITS: usize = 19;

pub(crate) fn trim(limbs: &mut Vec<u64>) {
    while limbs.last() == Some(&0) {
        limbs.pop();
    }
}

pub(crate) fn compare(a: &[u64], b: &[u64]) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.iter().rev().cmp(b.iter().rev()))
}

pub(crate) fn add(a: &[u64], b: &[u64]) -> Vec<u64> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut out = Vec::with_capacity(long.len() + 1);
    let mut carry = false;
    for (i, &x) in long.iter().enumerate() {
        let y = short.get(i).copied().unwrap_or(0);
        let (partial, first) = x.overflowing_add(y);
        let (sum, second) = partial.overflowing_add(u64::from(carry));
        out.push(sum);
        carry = first || second;
    }
    if carry {
        out.push(1);
    }
    out
}

pub(crate) fn shift_left(limbs: &[u64], bits: u32) -> Vec<u64> {
    if limbs.is_empty() {
        return Vec::new();
    }
    let shift = bits % 64;
    let mut out = vec![0u64; (bits / 64) as usize];
    if shift == 0 {
        out.extend_from_slice(limbs);
        return out;
    }
    let mut carry = 0u64;
    for &limb in limbs {
        out.push((limb << shift) | carry);
        carry = limb >> (64 - shift);
    }
    if carry != 0 {
        out.push(carry);
    }
    out
}

pub(crate) fn shift_right(limbs: &[u64], bits: u32) -> Vec<u64> {
    let Some(rest) = limbs.get((bits / 64) as usize..) else {
        return Vec::new();
    };
    let shift = bits % 64;
    let mut out: Vec<u64> = if shift == 0 {
        rest.to_vec()
    } else {
        rest.iter()
            .enumerate()
            .map(|(i, &limb)| {
                let high = rest.get(i + 1).map_or(0, |next| next << (64 - shift));
                (limb >> shift) | high
            })
            .collect()
    };
    trim(&mut out);
    out
}

/// `limbs * factor + addend`.
pub(crate) fn mul_add_small(limbs: &[u64], factor: u64, addend: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(limbs.len() + 1);
    let mut carry = u128::from(addend);
    for &limb in limbs {
        let current = u128::from(limb) * u128::from(factor) + carry;
        out.push(current as u64);
        carry = current >> 64;
    }
    if carry != 0 {
        out.push(carry as u64);
    }
    trim(&mut out);
    out
}

pub(crate) fn trailing_zeros(limbs: &[u64]) -> u32 {
    let mut total = 0u32;
    for &limb in limbs {
        if limb != 0 {
            return total + limb.trailing_zeros();
        }
        total += 64;
    }
    total
}

/// Index of the only set bit, when `limbs` is a power of two.
pub(crate) fn power_of_two(limbs: &[u64]) -> Option<u32> {
    let (top, below) = limbs.split_last()?;
    (top.count_ones() == 1 && below.iter().all(|limb| *limb == 0))
        .then(|| (below.len() as u32) * 64 + top.trailing_zeros())
}

/// Parse ASCII decimal digits. `None` on an empty string or a non-digit.
pub(crate) fn parse_decimal(digits: &str) -> Option<Vec<u64>> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut limbs = Vec::new();
    let head = digits.len() % DECIMAL_CHUNK_DIGITS;
    let mut start = 0;
    while start < digits.len() {
        let end = if start == 0 && head != 0 {
            head
        } else {
            start + DECIMAL_CHUNK_DIGITS
        };
        let value: u64 = digits.get(start..end)?.parse().ok()?;
        limbs = mul_add_small(&limbs, 10u64.pow((end - start) as u32), value);
        start = end;
    }
    Some(limbs)
}

pub(crate) fn to_decimal(limbs: &[u64]) -> String {
    let mut rest = limbs.to_vec();
    let mut chunks = Vec::new();
    while !rest.is_empty() {
        let mut remainder = 0u128;
        for limb in rest.iter_mut().rev() {
            let current = (remainder << 64) | u128::from(*limb);
            *limb = (current / u128::from(DECIMAL_CHUNK)) as u64;
            remainder = current % u128::from(DECIMAL_CHUNK);
        }
        chunks.push(remainder as u64);
        trim(&mut rest);
    }

    let Some(first) = chunks.pop() else {
        return "0".to_string();
    };
    let mut rendered = first.to_string();
    for chunk in chunks.iter().rev() {
        rendered.push_str(&format!("{:0width$}", chunk, width = DECIMAL_CHUNK_DIGITS));
    }
    rendered
}
