use serde::{Deserialize, Serialize};

/// One address block of a person (residential or commercial).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub zip_code: Option<String>,
    pub country: Option<i64>,
    pub state: Option<i64>,
    pub municipality: Option<i64>,
    pub district: Option<String>,
    pub number: Option<String>,
    pub street: Option<String>,
    pub complement: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub mailing: Option<bool>,
}

impl Address {
    /// Strips punctuation from the zip code and phone fields.
    pub fn normalized(mut self) -> Address {
        let digits = |v: Option<String>| {
            v.map(|s| super::digits_only(&s))
                .filter(|s| !s.is_empty())
        };
        self.zip_code = digits(self.zip_code);
        self.phone = digits(self.phone);
        self.mobile = digits(self.mobile);
        self
    }
}

/// Row of the `CEP` reference table, joined with the municipality name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipCodeRecord {
    pub zip_code: String,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state_code: Option<String>,
    pub municipality_id: Option<i64>,
    pub municipality_name: Option<String>,
    pub state_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Municipality {
    pub id: i64,
    pub name: String,
    pub state_id: Option<i64>,
    pub ibge_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// How a municipality listing is narrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MunicipalityFilter {
    All,
    StateCode(String),
    StateId(i64),
}

impl MunicipalityFilter {
    /// Two letters select by state code, digits by state id, anything else lists all.
    pub fn parse(raw: Option<&str>) -> MunicipalityFilter {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return MunicipalityFilter::All;
        };
        if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return MunicipalityFilter::StateCode(raw.to_ascii_uppercase());
        }
        match raw.parse::<i64>() {
            Ok(id) => MunicipalityFilter::StateId(id),
            Err(_) => MunicipalityFilter::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_zip_and_phones_to_digits() {
        let address = Address {
            zip_code: Some("79.002-200".into()),
            phone: Some("(67) 3333-4444".into()),
            mobile: Some("--".into()),
            ..Address::default()
        }
        .normalized();
        assert_eq!(address.zip_code.as_deref(), Some("79002200"));
        assert_eq!(address.phone.as_deref(), Some("6733334444"));
        assert_eq!(address.mobile, None);
    }

    #[test]
    fn municipality_filter_recognizes_code_and_id() {
        assert_eq!(
            MunicipalityFilter::parse(Some("ms")),
            MunicipalityFilter::StateCode("MS".into())
        );
        assert_eq!(
            MunicipalityFilter::parse(Some("12")),
            MunicipalityFilter::StateId(12)
        );
        assert_eq!(MunicipalityFilter::parse(None), MunicipalityFilter::All);
        assert_eq!(MunicipalityFilter::parse(Some("abc")), MunicipalityFilter::All);
    }
}
