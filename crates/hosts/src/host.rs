use serde::{Deserialize, Serialize};

use dreambook_core::{DomainError, DomainResult, HostId, impl_entity};

pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub location: String,
    /// 0.0 ..= 5.0
    pub rating: f64,
    pub image: String,
}

impl_entity!(Host, HostId);

impl core::fmt::Display for Host {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHost {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub rating: f64,
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub rating: Option<f64>,
    pub image: Option<String>,
}

fn validate_short(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(value.to_string())
}

fn validate_rating(rating: f64) -> DomainResult<f64> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(DomainError::out_of_range("rating", 0, 5));
    }
    Ok(rating)
}

fn validate_image(image: &str) -> DomainResult<String> {
    let image = image.trim();
    if !(image.starts_with("http://") || image.starts_with("https://")) {
        return Err(DomainError::validation("image must be an http(s) URL"));
    }
    Ok(image.to_string())
}

impl Host {
    pub fn create(cmd: NewHost) -> DomainResult<Self> {
        Ok(Self {
            id: HostId::new(),
            name: validate_short("name", &cmd.name)?,
            location: validate_short("location", &cmd.location)?,
            rating: validate_rating(cmd.rating)?,
            image: validate_image(&cmd.image)?,
        })
    }

    pub fn apply(&mut self, patch: HostPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            self.name = validate_short("name", &name)?;
        }
        if let Some(location) = patch.location {
            self.location = validate_short("location", &location)?;
        }
        if let Some(rating) = patch.rating {
            self.rating = validate_rating(rating)?;
        }
        if let Some(image) = patch.image {
            self.image = validate_image(&image)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostQuery {
    /// Case-insensitive substring of `location`.
    pub search: Option<String>,
}

impl HostQuery {
    pub fn apply(&self, hosts: &mut Vec<Host>) {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            hosts.retain(|h| h.location.to_lowercase().contains(&needle));
        }
        hosts.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, location: &str) -> Host {
        Host::create(NewHost {
            name: name.to_string(),
            location: location.to_string(),
            rating: 4.5,
            image: "https://example.com/host.jpg".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn rating_is_bounded() {
        let mut h = host("Anna", "Kraków");
        assert!(h.apply(HostPatch { rating: Some(5.5), ..Default::default() }).is_err());
        assert!(h.apply(HostPatch { rating: Some(0.0), ..Default::default() }).is_ok());
    }

    #[test]
    fn search_matches_location_only() {
        let mut hosts = vec![host("Warsaw Joe", "Gdańsk"), host("Ola", "Warsaw")];
        HostQuery { search: Some("warsaw".into()) }.apply(&mut hosts);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "Ola");
    }

    #[test]
    fn image_must_be_url() {
        let err = Host::create(NewHost {
            name: "X".into(),
            location: "Y".into(),
            rating: 0.0,
            image: "not a url".into(),
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn display_shows_location() {
        assert_eq!(host("Anna", "Kraków").to_string(), "Anna (Kraków)");
    }
}
