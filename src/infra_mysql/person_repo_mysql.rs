use super::util::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

pub struct MySqlPersonRepo {
    pool: MySqlPool,
}

impl MySqlPersonRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPersonRepo { pool }
    }

    #[inline]
    fn flag(mailing: Option<bool>) -> Option<&'static str> {
        mailing.map(|m| if m { "S" } else { "N" })
    }
}

#[async_trait::async_trait]
impl PersonRepo for MySqlPersonRepo {
    async fn tax_id_exists(&self, tax_id_digits: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM Pessoa WHERE CPFCNPJ = ? LIMIT 1")
            .bind(tax_id_digits)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.is_some())
    }

    async fn insert(&self, person: &NewPerson) -> Result<(), StoreError> {
        let res = &person.residential;
        let com = &person.commercial;

        sqlx::query(
            r#"
INSERT INTO Pessoa (
    ID, Nome, NomeSocial, TipoPessoa, CPFCNPJ, Sexo, EstadoCivil,
    DataNascimentoFundacao, NomeMae, NomePai, Municipio,
    CEPResidencial, PaisResidencial, EstadoResidencial, MunicipioResidencial,
    BairroResidencial, NumeroResidencial, LogradouroResidencial, ComplementoResidencial,
    EmailResidencial, TelefoneCelular, TelefoneResidencial, CorrespondenciaResidencial,
    CEPComercial, PaisComercial, EstadoComercial, MunicipioComercial,
    BairroComercial, NumeroComercial, LogradouroComercial, ComplementoComercial,
    EmailComercial, Telefone2Comercial, TelefoneComercial, CorrespondenciaComercial,
    CreatedBy, CreatedOn, Ativo, LoginUsers
)
VALUES (
    ?, ?, ?, ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, ?, ?,
    ?, ?, 'S', ?
)
"#,
        )
        .bind(person.id.to_string())
        .bind(&person.name)
        .bind(&person.social_name)
        .bind(person.person_type.code())
        .bind(&person.tax_id_digits)
        .bind(person.sex.code())
        .bind(person.marital_status.map(|m| m.code()))
        .bind(person.birth_date)
        .bind(&person.mother_name)
        .bind(&person.father_name)
        .bind(person.municipality)
        .bind(&res.zip_code)
        .bind(res.country)
        .bind(res.state)
        .bind(res.municipality)
        .bind(&res.district)
        .bind(&res.number)
        .bind(&res.street)
        .bind(&res.complement)
        .bind(&res.email)
        .bind(&res.mobile)
        .bind(&res.phone)
        .bind(Self::flag(res.mailing))
        .bind(&com.zip_code)
        .bind(com.country)
        .bind(com.state)
        .bind(com.municipality)
        .bind(&com.district)
        .bind(&com.number)
        .bind(&com.street)
        .bind(&com.complement)
        .bind(&com.email)
        .bind(&com.mobile)
        .bind(&com.phone)
        .bind(Self::flag(com.mailing))
        .bind(person.created_by.to_string())
        .bind(person.created_on.naive_utc())
        .bind(person.login_user.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}
