//! Moneda Use Cases

use std::sync::Arc;

use accounts::models::Usuario;
use chrono::{DateTime, Utc};
use kernel::id::MonedaId;

use crate::application::require;
use crate::domain::entity::{Moneda, MonedaFields};
use crate::domain::repository::MonedaRepository;
use crate::domain::value_object::CodigoMoneda;
use crate::error::{CatalogError, CatalogResult};

pub const MONEDAS_WRITE: &str = "monedas:write";

pub struct CreateMonedaInput {
    pub codigo: String,
    pub nombre: String,
    pub simbolo: String,
}

#[derive(Default)]
pub struct UpdateMonedaInput {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    pub simbolo: Option<String>,
    pub esta_activo: Option<bool>,
}

pub struct QueryMonedasUseCase<R>
where
    R: MonedaRepository,
{
    repo: Arc<R>,
}

impl<R> QueryMonedasUseCase<R>
where
    R: MonedaRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: MonedaId) -> CatalogResult<Moneda> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::MonedaNotFound)
    }

    pub async fn get_by_codigo(&self, codigo: &str) -> CatalogResult<Moneda> {
        // A malformed code cannot match anything.
        let codigo = CodigoMoneda::new(codigo).map_err(|_| CatalogError::MonedaNotFound)?;
        self.repo
            .find_by_codigo(&codigo)
            .await?
            .ok_or(CatalogError::MonedaNotFound)
    }

    pub async fn list(&self) -> CatalogResult<Vec<Moneda>> {
        self.repo.list_active().await
    }
}

pub struct ManageMonedasUseCase<R>
where
    R: MonedaRepository,
{
    repo: Arc<R>,
}

impl<R> ManageMonedasUseCase<R>
where
    R: MonedaRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        actor: &Usuario,
        input: CreateMonedaInput,
        now: DateTime<Utc>,
    ) -> CatalogResult<Moneda> {
        require(actor, MONEDAS_WRITE)?;

        let fields = MonedaFields::new(CodigoMoneda::new(input.codigo)?, input.nombre, input.simbolo)?;
        if self.repo.find_by_codigo(&fields.codigo).await?.is_some() {
            return Err(CatalogError::MonedaCodigoTaken(fields.codigo.to_string()));
        }

        let moneda = self.repo.create(&fields, now).await?;
        tracing::info!(moneda_id = %moneda.id, codigo = %moneda.fields.codigo, "Moneda created");
        Ok(moneda)
    }

    pub async fn update(
        &self,
        actor: &Usuario,
        id: MonedaId,
        input: UpdateMonedaInput,
        now: DateTime<Utc>,
    ) -> CatalogResult<Moneda> {
        require(actor, MONEDAS_WRITE)?;

        let mut moneda = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::MonedaNotFound)?;

        if let Some(codigo) = input.codigo {
            let codigo = CodigoMoneda::new(codigo)?;
            if codigo != moneda.fields.codigo {
                if let Some(other) = self.repo.find_by_codigo(&codigo).await? {
                    if other.id != id {
                        return Err(CatalogError::MonedaCodigoTaken(codigo.to_string()));
                    }
                }
            }
            moneda.fields.codigo = codigo;
        }
        if let Some(nombre) = input.nombre {
            moneda.fields.nombre = nombre.trim().to_string();
        }
        if let Some(simbolo) = input.simbolo {
            moneda.fields.simbolo = simbolo.trim().to_string();
        }
        if let Some(esta_activo) = input.esta_activo {
            moneda.fields.esta_activo = esta_activo;
        }
        moneda.fields.validate()?;

        let updated = self.repo.update(&moneda, now).await?;
        tracing::info!(moneda_id = %id, "Moneda updated");
        Ok(updated)
    }

    /// Soft delete: the moneda stays referenced by existing rows.
    pub async fn delete(&self, actor: &Usuario, id: MonedaId, now: DateTime<Utc>) -> CatalogResult<()> {
        require(actor, MONEDAS_WRITE)?;

        if !self.repo.deactivate(id, now).await? {
            return Err(CatalogError::MonedaNotFound);
        }
        tracing::info!(moneda_id = %id, "Moneda deactivated");
        Ok(())
    }
}
