use serde::{Deserialize, Serialize};

/// `Pessoa.TipoPessoa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonType {
    #[serde(rename = "F")]
    Individual,
    #[serde(rename = "J")]
    Company,
}

impl PersonType {
    pub fn code(self) -> &'static str {
        match self {
            PersonType::Individual => "F",
            PersonType::Company => "J",
        }
    }
}

/// `Pessoa.Sexo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "N")]
    Unspecified,
}

impl Sex {
    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unspecified => "N",
        }
    }
}

/// `Pessoa.EstadoCivil`, a code in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MaritalStatus(u8);

impl MaritalStatus {
    pub const NOT_INFORMED: MaritalStatus = MaritalStatus(8);

    pub fn code(self) -> u8 {
        self.0
    }
}

impl Default for MaritalStatus {
    fn default() -> Self {
        MaritalStatus::NOT_INFORMED
    }
}

impl TryFrom<u8> for MaritalStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        if MARITAL_STATUS_OPTIONS.iter().any(|(c, _)| *c == code) {
            Ok(MaritalStatus(code))
        } else {
            Err(format!("unknown marital status code {}", code))
        }
    }
}

impl From<MaritalStatus> for u8 {
    fn from(status: MaritalStatus) -> u8 {
        status.0
    }
}

const MARITAL_STATUS_OPTIONS: [(u8, &str); 8] = [
    (1, "Casado(a)"),
    (2, "Divorciado"),
    (3, "Solteiro(a)"),
    (4, "Viúvo(a)"),
    (5, "União Estável"),
    (6, "Outros"),
    (7, "Separado Judicialmente"),
    (8, "Não Informado"),
];

/// One entry of a select box served to the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionItem {
    pub value: String,
    pub label: String,
}

impl OptionItem {
    fn new(value: impl ToString, label: &str) -> Self {
        OptionItem {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

pub fn marital_status_options() -> Vec<OptionItem> {
    MARITAL_STATUS_OPTIONS
        .iter()
        .map(|(code, label)| OptionItem::new(code, label))
        .collect()
}

pub fn sex_options() -> Vec<OptionItem> {
    vec![
        OptionItem::new("M", "Masculino"),
        OptionItem::new("F", "Feminino"),
        OptionItem::new("N", "Não Informado"),
    ]
}

pub fn person_type_options() -> Vec<OptionItem> {
    vec![
        OptionItem::new("F", "Pessoa Física"),
        OptionItem::new("J", "Pessoa Jurídica"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marital_status_rejects_codes_outside_domain() {
        assert!(MaritalStatus::try_from(0).is_err());
        assert!(MaritalStatus::try_from(9).is_err());
        assert_eq!(MaritalStatus::try_from(3).map(|s| s.code()), Ok(3));
        assert!(serde_json::from_str::<MaritalStatus>("12").is_err());
    }

    #[test]
    fn option_lists_use_legacy_codes() {
        let marital = marital_status_options();
        assert_eq!(marital.len(), 8);
        assert_eq!(marital[7].value, "8");
        assert_eq!(sex_options()[2].value, "N");
        assert_eq!(person_type_options()[0].value, "F");
    }
}
