//! Short-Weierstrass curve arithmetic over a prime field.
//!
//! Points are kept in affine coordinates. Addition and doubling use the
//! textbook formulas with a modular inverse; scalar multiplication is
//! left-to-right double-and-add. Every point built from external input is
//! checked against y^2 = x^3 + a*x + b (mod p).
//!
//! None of this is constant-time: `mul` branches on scalar bits and the
//! `BigUint` operations take data-dependent time, so timing can leak the
//! private scalars passed through `PrivateKey::pub_key` and `ecdsa::sign`.

use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::util::int_to_octets;
use crate::PrimitivesError;

/// secp256k1 field prime p = 2^256 - 2^32 - 977.
const SECP256K1_P: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF,
    0xFC, 0x2F,
];

/// secp256k1 group order n.
const SECP256K1_N: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

const SECP256K1_GX: [u8; 32] = [
    0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B,
    0x07, 0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8,
    0x17, 0x98,
];

const SECP256K1_GY: [u8; 32] = [
    0x48, 0x3A, 0xDA, 0x77, 0x26, 0xA3, 0xC4, 0x65, 0x5D, 0xA4, 0xFB, 0xFC, 0x0E, 0x11, 0x08,
    0xA8, 0xFD, 0x17, 0xB4, 0x48, 0xA6, 0x85, 0x54, 0x19, 0x9C, 0x47, 0xD0, 0x8F, 0xFB, 0x10,
    0xD4, 0xB8,
];

static SECP256K1: OnceLock<Curve> = OnceLock::new();

/// The secp256k1 curve, built on first use and shared read-only afterwards.
pub fn secp256k1() -> &'static Curve {
    SECP256K1.get_or_init(|| Curve {
        name: "secp256k1",
        p: BigUint::from_bytes_be(&SECP256K1_P),
        a: BigUint::zero(),
        b: BigUint::from(7u32),
        g: Point::Affine {
            x: BigUint::from_bytes_be(&SECP256K1_GX),
            y: BigUint::from_bytes_be(&SECP256K1_GY),
        },
        n: BigUint::from_bytes_be(&SECP256K1_N),
        h: 1,
    })
}

/// A curve point: the point at infinity or an affine pair.
#[derive(Clone, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine { x: BigUint, y: BigUint },
}

impl Point {
    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    pub fn x(&self) -> Option<&BigUint> {
        match self {
            Point::Affine { x, .. } => Some(x),
            Point::Infinity => None,
        }
    }

    pub fn y(&self) -> Option<&BigUint> {
        match self {
            Point::Affine { y, .. } => Some(y),
            Point::Infinity => None,
        }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity => f.write_str("Point(infinity)"),
            Point::Affine { x, y } => write!(f, "Point({:x}, {:x})", x, y),
        }
    }
}

/// Immutable domain parameters (p, a, b, G, n, h) of a prime-field curve.
#[derive(Clone, PartialEq, Eq)]
pub struct Curve {
    name: &'static str,
    p: BigUint,
    a: BigUint,
    b: BigUint,
    g: Point,
    n: BigUint,
    h: u32,
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curve").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Curve {
    /// Build a curve from its domain parameters.
    ///
    /// # Returns
    /// The curve, or `PointNotOnCurve` if the generator does not satisfy
    /// the curve equation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &'static str,
        p: BigUint,
        a: BigUint,
        b: BigUint,
        gx: BigUint,
        gy: BigUint,
        n: BigUint,
        h: u32,
    ) -> Result<Self, PrimitivesError> {
        let mut curve = Curve { name, p, a, b, g: Point::Infinity, n, h };
        curve.g = curve.point(gx, gy)?;
        Ok(curve)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Field prime p.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn a(&self) -> &BigUint {
        &self.a
    }

    pub fn b(&self) -> &BigUint {
        &self.b
    }

    /// Generator point G.
    pub fn generator(&self) -> &Point {
        &self.g
    }

    /// Order n of the generator.
    pub fn order(&self) -> &BigUint {
        &self.n
    }

    pub fn cofactor(&self) -> u32 {
        self.h
    }

    /// Byte length of a field element.
    pub fn field_len(&self) -> usize {
        ((self.p.bits() + 7) / 8) as usize
    }

    /// Byte length of a scalar modulo n.
    pub fn scalar_len(&self) -> usize {
        ((self.n.bits() + 7) / 8) as usize
    }

    /// Build a validated affine point.
    pub fn point(&self, x: BigUint, y: BigUint) -> Result<Point, PrimitivesError> {
        let point = Point::Affine { x, y };
        if !self.is_on_curve(&point) {
            tracing::warn!(curve = self.name, "rejected point not on curve");
            return Err(PrimitivesError::PointNotOnCurve);
        }
        Ok(point)
    }

    /// Check y^2 = x^3 + a*x + b (mod p) with both coordinates reduced.
    ///
    /// The point at infinity is on every curve.
    pub fn is_on_curve(&self, point: &Point) -> bool {
        match point {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                if x >= &self.p || y >= &self.p {
                    return false;
                }
                (y * y) % &self.p == self.rhs(x)
            }
        }
    }

    /// x^3 + a*x + b mod p.
    fn rhs(&self, x: &BigUint) -> BigUint {
        (x * x * x + &self.a * x + &self.b) % &self.p
    }

    fn sub_mod(&self, a: &BigUint, b: &BigUint) -> BigUint {
        ((a % &self.p) + &self.p - (b % &self.p)) % &self.p
    }

    /// Inverse of `v` modulo the field prime; `v` must be non-zero mod p.
    fn inv_mod_p(&self, v: &BigUint) -> BigUint {
        v.modinv(&self.p).unwrap_or_else(BigUint::zero)
    }

    /// -P.
    pub fn negate(&self, point: &Point) -> Point {
        match point {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::Affine {
                x: x.clone(),
                y: (&self.p - y) % &self.p,
            },
        }
    }

    /// P + Q.
    pub fn add(&self, lhs: &Point, rhs: &Point) -> Point {
        let (x1, y1, x2, y2) = match (lhs, rhs) {
            (Point::Infinity, q) => return q.clone(),
            (q, Point::Infinity) => return q.clone(),
            (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
        };
        if x1 == x2 {
            if y1 == y2 {
                return self.double(lhs);
            }
            // Q = -P
            return Point::Infinity;
        }
        let lambda = self.sub_mod(y2, y1) * self.inv_mod_p(&self.sub_mod(x2, x1)) % &self.p;
        let x3 = self.sub_mod(&(&lambda * &lambda), &(x1 + x2));
        let y3 = self.sub_mod(&(&lambda * self.sub_mod(x1, &x3)), y1);
        Point::Affine { x: x3, y: y3 }
    }

    /// 2P.
    pub fn double(&self, point: &Point) -> Point {
        let (x, y) = match point {
            Point::Infinity => return Point::Infinity,
            Point::Affine { x, y } => (x, y),
        };
        if y.is_zero() {
            return Point::Infinity;
        }
        let num = (BigUint::from(3u32) * x * x + &self.a) % &self.p;
        let den = self.inv_mod_p(&((BigUint::from(2u32) * y) % &self.p));
        let lambda = num * den % &self.p;
        let x3 = self.sub_mod(&(&lambda * &lambda), &(BigUint::from(2u32) * x));
        let y3 = self.sub_mod(&(&lambda * self.sub_mod(x, &x3)), y);
        Point::Affine { x: x3, y: y3 }
    }

    /// k*P by left-to-right double-and-add. Variable-time in k.
    pub fn mul(&self, k: &BigUint, point: &Point) -> Point {
        let mut acc = Point::Infinity;
        for i in (0..k.bits()).rev() {
            acc = self.double(&acc);
            if k.bit(i) {
                acc = self.add(&acc, point);
            }
        }
        acc
    }

    /// k*G, with k reduced mod n first.
    pub fn mul_generator(&self, k: &BigUint) -> Point {
        self.mul(&(k % &self.n), &self.g)
    }

    /// u1*G + u2*Q, the combination ECDSA verification needs.
    pub fn mul_add(&self, u1: &BigUint, u2: &BigUint, q: &Point) -> Point {
        self.add(&self.mul_generator(u1), &self.mul(u2, q))
    }

    /// Recover the y coordinate for `x` with the requested parity.
    ///
    /// Uses y = alpha^((p+1)/4), so only primes p = 3 (mod 4) are supported.
    ///
    /// # Returns
    /// The parity-matched root, or `PointNotOnCurve` when x^3 + a*x + b
    /// has no square root mod p.
    pub fn y_for_x(&self, x: &BigUint, odd: bool) -> Result<BigUint, PrimitivesError> {
        if (&self.p % 4u32) != BigUint::from(3u32) {
            return Err(PrimitivesError::Other(format!(
                "square root mod p unsupported for curve {}",
                self.name
            )));
        }
        if x >= &self.p {
            return Err(PrimitivesError::PointNotOnCurve);
        }
        let alpha = self.rhs(x);
        let exp = (&self.p + BigUint::one()) >> 2;
        let beta = alpha.modpow(&exp, &self.p);
        if (&beta * &beta) % &self.p != alpha {
            tracing::warn!(curve = self.name, "x coordinate has no point on curve");
            return Err(PrimitivesError::PointNotOnCurve);
        }
        if beta.bit(0) == odd {
            Ok(beta)
        } else {
            Ok((&self.p - &beta) % &self.p)
        }
    }

    /// Serialize a point: 0x02/0x03 || x when compressed, 0x04 || x || y
    /// otherwise, and a single 0x00 for infinity.
    pub fn encode_point(&self, point: &Point, compressed: bool) -> Vec<u8> {
        let len = self.field_len();
        match point {
            Point::Infinity => vec![0x00],
            Point::Affine { x, y } => {
                let xb = int_to_octets(x, len).unwrap_or_default();
                if compressed {
                    let mut out = Vec::with_capacity(len + 1);
                    out.push(if y.bit(0) { 0x03 } else { 0x02 });
                    out.extend_from_slice(&xb);
                    out
                } else {
                    let mut out = Vec::with_capacity(2 * len + 1);
                    out.push(0x04);
                    out.extend_from_slice(&xb);
                    out.extend_from_slice(&int_to_octets(y, len).unwrap_or_default());
                    out
                }
            }
        }
    }

    /// Parse and validate a serialized point (SEC 1, 2.3.4).
    pub fn decode_point(&self, bytes: &[u8]) -> Result<Point, PrimitivesError> {
        let len = self.field_len();
        match bytes {
            [0x00] => Ok(Point::Infinity),
            [prefix @ (0x02 | 0x03), x @ ..] if x.len() == len => {
                let x = BigUint::from_bytes_be(x);
                let y = self.y_for_x(&x, *prefix == 0x03)?;
                Ok(Point::Affine { x, y })
            }
            [0x04, rest @ ..] if rest.len() == 2 * len => {
                let (x, y) = rest.split_at(len);
                self.point(BigUint::from_bytes_be(x), BigUint::from_bytes_be(y))
            }
            _ => Err(PrimitivesError::InvalidPublicKey(format!(
                "malformed point encoding of {} bytes",
                bytes.len()
            ))),
        }
    }
}
