//! ICC profile wrapper.

use std::path::Path;

use lcms2::{ColorSpaceSignature, InfoType, Locale, Profile as LcmsProfile};
use tracing::{debug, trace};

use crate::{CmsError, CmsResult};

/// An ICC colour profile.
///
/// Profiles come from files, from raw ICC bytes, or from the engine's
/// built-in constructors (sRGB, Lab D50, gray D50 with gamma 2.2).
///
/// # Example
///
/// ```rust
/// use uc_cms::Profile;
///
/// let srgb = Profile::srgb();
/// assert!(srgb.is_rgb());
/// println!("{}", srgb.name());
/// ```
pub struct Profile {
    pub(crate) inner: LcmsProfile,
}

impl Profile {
    /// Loads a profile from an ICC file.
    ///
    /// # Errors
    ///
    /// [`CmsError::LoadFailed`] if the file is missing or not a profile.
    pub fn open(path: impl AsRef<Path>) -> CmsResult<Self> {
        let path = path.as_ref();
        trace!(path = %path.display(), "Profile::open");
        let inner = LcmsProfile::new_file(path)
            .map_err(|e| CmsError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "profile loaded");
        Ok(Self { inner })
    }

    /// Creates a profile from raw ICC data.
    pub fn from_bytes(data: &[u8]) -> CmsResult<Self> {
        trace!(len = data.len(), "Profile::from_bytes");
        let inner =
            LcmsProfile::new_icc(data).map_err(|e| CmsError::InvalidProfile(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Built-in sRGB profile.
    pub fn srgb() -> Self {
        Self {
            inner: LcmsProfile::new_srgb(),
        }
    }

    /// Built-in CIE Lab profile, D50 white.
    pub fn lab() -> CmsResult<Self> {
        let inner =
            LcmsProfile::new_lab4_context(lcms2::GlobalContext::new(), &lcms2::CIExyY::d50())
                .map_err(|e| CmsError::CreateFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Built-in gray profile, D50 white and gamma 2.2.
    pub fn gray() -> CmsResult<Self> {
        Self::gray_gamma(2.2)
    }

    /// Gray profile with the given transfer gamma.
    pub fn gray_gamma(gamma: f64) -> CmsResult<Self> {
        let curve = lcms2::ToneCurve::new(gamma);
        let inner = LcmsProfile::new_gray(&lcms2::CIExyY::d50(), &curve)
            .map_err(|e| CmsError::CreateFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    fn info(&self, kind: InfoType) -> Option<String> {
        self.inner
            .info(kind, Locale::none())
            .filter(|s| !s.is_empty())
    }

    /// Product description, the profile's display name.
    pub fn name(&self) -> String {
        self.info(InfoType::Description).unwrap_or_default()
    }

    /// Product name: the model tag, else the description.
    pub fn product(&self) -> String {
        self.info(InfoType::Model)
            .or_else(|| self.info(InfoType::Description))
            .unwrap_or_default()
    }

    /// Copyright text, empty if the profile has none.
    pub fn copyright(&self) -> String {
        self.info(InfoType::Copyright).unwrap_or_default()
    }

    /// Manufacturer text, empty if absent.
    pub fn manufacturer(&self) -> String {
        self.info(InfoType::Manufacturer).unwrap_or_default()
    }

    /// Data colour space signature, e.g. `RgbData`.
    pub fn color_space(&self) -> String {
        format!("{:?}", self.inner.color_space())
    }

    /// True for RGB profiles.
    pub fn is_rgb(&self) -> bool {
        matches!(self.inner.color_space(), ColorSpaceSignature::RgbData)
    }

    /// True for CMYK profiles.
    pub fn is_cmyk(&self) -> bool {
        matches!(self.inner.color_space(), ColorSpaceSignature::CmykData)
    }

    /// True for CIE Lab profiles.
    pub fn is_lab(&self) -> bool {
        matches!(self.inner.color_space(), ColorSpaceSignature::LabData)
    }

    /// True for gray profiles.
    pub fn is_gray(&self) -> bool {
        matches!(self.inner.color_space(), ColorSpaceSignature::GrayData)
    }

    /// Serializes the profile to ICC bytes.
    pub fn to_bytes(&self) -> CmsResult<Vec<u8>> {
        self.inner
            .icc()
            .map_err(|e| CmsError::CreateFailed(e.to_string()))
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name())
            .field("color_space", &self.color_space())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb() {
        let profile = Profile::srgb();
        assert!(profile.is_rgb());
        assert!(!profile.name().is_empty());
        assert!(!profile.product().is_empty());
    }

    #[test]
    fn test_lab() {
        let profile = Profile::lab().unwrap();
        assert!(!profile.is_rgb());
        assert!(profile.is_lab());
        assert!(profile.color_space().contains("Lab"));
    }

    #[test]
    fn test_gray() {
        assert!(Profile::gray().unwrap().is_gray());
    }

    #[test]
    fn test_missing_file() {
        let err = Profile::open("/nonexistent/profile.icc").unwrap_err();
        assert!(matches!(err, CmsError::LoadFailed(_)));
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(Profile::from_bytes(b"not an icc profile").is_err());
    }

    #[test]
    fn test_bytes_reload() {
        let data = Profile::srgb().to_bytes().unwrap();
        let reloaded = Profile::from_bytes(&data).unwrap();
        assert!(reloaded.is_rgb());
        assert_eq!(reloaded.name(), Profile::srgb().name());
    }
}
