use aliri_base64::{Base64Url, Base64UrlRef};
use p521::ecdsa::signature::Verifier as _;

use super::{Curve, SigningAlgorithm};
use crate::{error, jws};

const UNCOMPRESSED_TAG: u8 = 0x04;

/// ECC public key
///
/// The point is held in uncompressed SEC1 form.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublicKey {
    curve: Curve,
    point: Base64Url,
}

impl PublicKey {
    /// Constructs a public key from a SEC1 encoded point
    ///
    /// P-256 and P-384 points must be uncompressed. P-521 points may be
    /// compressed and are checked against the curve equation immediately.
    ///
    /// # Errors
    ///
    /// The encoding is not a valid point for the curve.
    pub fn from_sec1(curve: Curve, point: &[u8]) -> Result<Self, error::KeyRejected> {
        let point = match curve {
            Curve::P256 | Curve::P384 => {
                if point.len() != 1 + 2 * curve.coordinate_size()
                    || point[0] != UNCOMPRESSED_TAG
                {
                    return Err(error::key_rejected(format!(
                        "expected an uncompressed {} point",
                        curve
                    )));
                }

                point.to_owned()
            }
            Curve::P521 => {
                let key = p521::ecdsa::VerifyingKey::from_sec1_bytes(point)
                    .map_err(|e| error::key_rejected(e.to_string()))?;
                key.to_encoded_point(false).as_bytes().to_owned()
            }
        };

        Ok(Self {
            curve,
            point: Base64Url::from_raw(point),
        })
    }

    /// Constructs a public key from its affine coordinates
    ///
    /// Coordinates shorter than the curve's field size are left-padded.
    ///
    /// # Errors
    ///
    /// A coordinate is too wide, or the point is not valid for the curve.
    pub fn from_coordinates(curve: Curve, x: &[u8], y: &[u8]) -> Result<Self, error::KeyRejected> {
        let size = curve.coordinate_size();
        if x.len() > size || y.len() > size {
            return Err(error::key_rejected(format!(
                "coordinate too wide for {}",
                curve
            )));
        }

        let mut point = Vec::with_capacity(1 + 2 * size);
        point.push(UNCOMPRESSED_TAG);
        point.resize(1 + size - x.len(), 0);
        point.extend_from_slice(x);
        point.resize(1 + 2 * size - y.len(), 0);
        point.extend_from_slice(y);

        Self::from_sec1(curve, &point)
    }

    /// The curve this key belongs to
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The uncompressed SEC1 encoding of the point
    #[must_use]
    pub fn point(&self) -> &Base64UrlRef {
        &self.point
    }

    /// The affine x coordinate, padded to the field size
    #[must_use]
    pub fn x(&self) -> &[u8] {
        let size = self.curve.coordinate_size();
        &self.point.as_slice()[1..=size]
    }

    /// The affine y coordinate, padded to the field size
    #[must_use]
    pub fn y(&self) -> &[u8] {
        let size = self.curve.coordinate_size();
        &self.point.as_slice()[1 + size..]
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::VerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.curve == Curve::from(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::key_mismatch(alg).into());
        }

        let ring_alg: &'static ring::signature::EcdsaVerificationAlgorithm = match alg {
            SigningAlgorithm::ES256 => &ring::signature::ECDSA_P256_SHA256_FIXED,
            SigningAlgorithm::ES384 => &ring::signature::ECDSA_P384_SHA384_FIXED,
            SigningAlgorithm::ES512 => return self.verify_p521(data, signature),
        };

        ring::signature::UnparsedPublicKey::new(ring_alg, self.point.as_slice())
            .verify(data, signature)
            .map_err(|_| error::signature_invalid().into())
    }
}

impl PublicKey {
    fn verify_p521(&self, data: &[u8], signature: &[u8]) -> Result<(), error::VerifyError> {
        let key = p521::ecdsa::VerifyingKey::from_sec1_bytes(self.point.as_slice())
            .map_err(|_| error::signature_invalid())?;
        let signature = p521::ecdsa::Signature::from_slice(signature)
            .map_err(|_| error::signature_invalid())?;

        key.verify(data, &signature)
            .map_err(|_| error::signature_invalid().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_points_are_refused_for_ring_curves() {
        let mut point = vec![0x02];
        point.extend([0x11; 32]);
        assert!(PublicKey::from_sec1(Curve::P256, &point).is_err());
    }

    #[test]
    fn p521_point_must_be_on_curve() {
        let mut point = vec![UNCOMPRESSED_TAG];
        point.extend([0x01; 132]);
        assert!(PublicKey::from_sec1(Curve::P521, &point).is_err());
    }

    #[test]
    fn wide_coordinates_are_refused() {
        assert!(PublicKey::from_coordinates(Curve::P256, &[1; 33], &[1; 32]).is_err());
    }

    #[test]
    fn coordinates_are_padded() {
        let key = PublicKey::from_coordinates(Curve::P384, &[7; 40], &[9; 48]).unwrap();
        assert_eq!(key.point().as_slice().len(), 97);
        assert_eq!(&key.x()[..8], &[0; 8]);
        assert_eq!(key.y(), &[9; 48][..]);
    }
}
