use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxIdError {
    #[error("CPF must contain 11 digits")]
    Length,
    #[error("invalid CPF")]
    CheckDigits,
}

/// A validated CPF (Brazilian individual taxpayer number).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf {
    digits: String,
}

impl Cpf {
    /// Parses any punctuation of a CPF and checks both verification digits.
    pub fn parse(input: &str) -> Result<Cpf, TaxIdError> {
        let digits = digits_only(input);
        if digits.len() != 11 {
            return Err(TaxIdError::Length);
        }

        let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
        if d.iter().all(|&x| x == d[0]) {
            return Err(TaxIdError::CheckDigits);
        }
        if check_digit(&d[..9]) != d[9] || check_digit(&d[..10]) != d[10] {
            return Err(TaxIdError::CheckDigits);
        }

        Ok(Cpf { digits })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// `XXX.XXX.XXX-XX`, the shape stored in `LoginUsers.UserID`.
    pub fn formatted(&self) -> String {
        let d = &self.digits;
        format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }

    /// Log-safe rendering: only the last four digits are kept.
    pub fn masked(&self) -> String {
        mask_digits(&self.digits)
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Replaces every digit that is followed by at least four more digits with `*`.
pub fn mask_digits(input: &str) -> String {
    let total = input.chars().filter(char::is_ascii_digit).count();
    let mut seen = 0;
    input
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if total - seen >= 4 {
                    return '*';
                }
            }
            c
        })
        .collect()
}

fn check_digit(prefix: &[u32]) -> u32 {
    let weight = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, &digit)| digit * (weight - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 { 0 } else { rest }
}
