use super::SequentialIdAllocator;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;

/// Country code the legacy schema uses for Brazil.
const DEFAULT_COUNTRY: i64 = 1;

#[derive(Debug, Clone, Copy)]
struct AllocatedIds {
    login_id: LegacyId,
    person_id: LegacyId,
}

pub struct RealRegistrationService {
    login_repo: Arc<dyn LoginRepo>,
    person_repo: Arc<dyn PersonRepo>,
    sequence_source: Arc<dyn SequenceSource>,
    id_allocator: SequentialIdAllocator,
    credential_hasher: Arc<dyn CredentialHasher>,
}

impl RealRegistrationService {
    pub fn new(
        login_repo: Arc<dyn LoginRepo>,
        person_repo: Arc<dyn PersonRepo>,
        sequence_source: Arc<dyn SequenceSource>,
        credential_hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            login_repo,
            person_repo,
            id_allocator: SequentialIdAllocator::new(sequence_source.clone()),
            sequence_source,
            credential_hasher,
        }
    }

    fn validate(request: &RegisterInput) -> Result<Cpf, RegistrationError> {
        let required = [
            &request.name,
            &request.cpf,
            &request.user_name,
            &request.password,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err(RegistrationError::Validation(
                "name, CPF, username and password are required".to_string(),
            ));
        }
        Cpf::parse(&request.cpf).map_err(|e| RegistrationError::Validation(e.to_string()))
    }

    async fn ensure_unused(
        &self,
        table: SequenceTable,
        id: LegacyId,
    ) -> Result<(), RegistrationError> {
        if self.sequence_source.id_exists(table, id).await? {
            return Err(RegistrationError::IdInUse {
                table: table.table,
                id,
            });
        }
        Ok(())
    }

    async fn resolve_id(
        &self,
        table: SequenceTable,
        requested: Option<LegacyId>,
    ) -> Result<LegacyId, RegistrationError> {
        match requested {
            Some(id) => {
                if id.0 < 1 || id.next().is_none() {
                    return Err(RegistrationError::Validation(format!(
                        "{} id must be between 1 and {}",
                        table.table,
                        i64::MAX - 1
                    )));
                }
                self.ensure_unused(table, id).await?;
                Ok(id)
            }
            None => Ok(self.id_allocator.allocate(table).await),
        }
    }

    fn new_person(
        request: &RegisterInput,
        cpf: &Cpf,
        ids: AllocatedIds,
        created_on: chrono::DateTime<Utc>,
    ) -> NewPerson {
        let mut person = NewPerson {
            id: ids.person_id,
            name: request.name.trim().to_string(),
            social_name: None,
            person_type: PersonType::Individual,
            tax_id_digits: cpf.digits().to_string(),
            sex: request.sex.unwrap_or_default(),
            marital_status: None,
            birth_date: None,
            mother_name: None,
            father_name: None,
            municipality: None,
            residential: Address::default(),
            commercial: Address::default(),
            created_by: request.created_by.unwrap_or(ids.login_id),
            created_on,
            login_user: ids.login_id,
        };

        if let Some(profile) = request.profile.clone() {
            let mut residential = profile.residential.normalized();
            residential.country.get_or_insert(DEFAULT_COUNTRY);
            residential.mailing.get_or_insert(true);
            let mut commercial = profile.commercial.normalized();
            commercial.country.get_or_insert(DEFAULT_COUNTRY);
            commercial.mailing.get_or_insert(false);

            person.social_name = profile.social_name;
            person.marital_status = Some(profile.marital_status.unwrap_or_default());
            person.birth_date = profile.birth_date;
            person.mother_name = profile.mother_name;
            person.father_name = profile.father_name;
            person.municipality = profile.municipality;
            person.residential = residential;
            person.commercial = commercial;
        }

        person
    }
}

#[async_trait::async_trait]
impl RegistrationService for RealRegistrationService {
    async fn register(
        &self,
        request: RegisterInput,
    ) -> Result<RegistrationResult, RegistrationError> {
        let cpf = Self::validate(&request)?;
        let user_name = request.user_name.trim().to_string();

        if self.person_repo.tax_id_exists(cpf.digits()).await? {
            return Err(RegistrationError::TaxIdTaken);
        }
        if self.login_repo.user_name_exists(&user_name).await? {
            return Err(RegistrationError::UserNameTaken);
        }

        let (login_id, person_id) = tokio::try_join!(
            self.resolve_id(SequenceTable::LOGIN_USERS, request.login_id),
            self.resolve_id(SequenceTable::PERSON, request.person_id),
        )?;
        let ids = AllocatedIds {
            login_id,
            person_id,
        };
        let password = self
            .credential_hasher
            .hash_password(&request.password)
            .await
            .map_err(|e| RegistrationError::InternalError(e.to_string()))?;
        let now = Utc::now();

        let login_user = NewLoginUser {
            id: ids.login_id,
            tax_id: cpf.formatted(),
            user_name: user_name.clone(),
            password,
            created_by: request.created_by.unwrap_or(LegacyId::SEED),
            created_on: now,
        };
        self.login_repo
            .insert(&login_user)
            .await
            .inspect_err(|e| warn!(login_id = %ids.login_id, "credential insert failed: {}", e))?;

        let person = Self::new_person(&request, &cpf, ids, now);
        if let Err(e) = self.person_repo.insert(&person).await {
            error!(
                login_id = %ids.login_id,
                person_id = %ids.person_id,
                "person insert failed after credential insert, credential row left without person: {}",
                e
            );
            return Err(e.into());
        }

        if let Err(e) = self.login_repo.link_person(ids.login_id, ids.person_id).await {
            warn!(login_id = %ids.login_id, "could not link credential to person: {}", e);
        }

        info!(
            login_id = %ids.login_id,
            person_id = %ids.person_id,
            cpf = %cpf.masked(),
            "registration completed"
        );

        Ok(RegistrationResult {
            login_id: ids.login_id,
            person_id: ids.person_id,
            cpf: cpf.formatted(),
            user_name,
            name: person.name,
        })
    }

    async fn tax_id_exists(&self, cpf: &str) -> Result<bool, RegistrationError> {
        let cpf = Cpf::parse(cpf).map_err(|e| RegistrationError::Validation(e.to_string()))?;
        Ok(self.person_repo.tax_id_exists(cpf.digits()).await?)
    }

    async fn user_name_exists(&self, user_name: &str) -> Result<bool, RegistrationError> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(RegistrationError::Validation(
                "username is required".to_string(),
            ));
        }
        Ok(self.login_repo.user_name_exists(user_name).await?)
    }
}
