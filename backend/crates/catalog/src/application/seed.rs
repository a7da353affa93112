//! Reference data every installation starts with.
//!
//! Seeding is per code: rows that already exist are left untouched, so it is
//! safe to run on every start.

use chrono::{DateTime, Utc};

use crate::domain::entity::{MonedaFields, TipoDocumentoFields};
use crate::domain::repository::{MonedaRepository, TipoDocumentoRepository};
use crate::domain::value_object::{CodigoDocumento, CodigoMoneda};
use crate::error::CatalogResult;

/// codigo, nombre, simbolo
const MONEDAS: &[(&str, &str, &str)] = &[
    ("USD", "Dólar Estadounidense", "$"),
    ("EUR", "Euro", "€"),
    ("CLP", "Peso Chileno", "$"),
    ("ARS", "Peso Argentino", "$"),
];

/// codigo, nombre, descripcion, es_default
const TIPOS_DOCUMENTO: &[(&str, &str, &str, bool)] = &[
    ("RUT", "Rol Único Tributario", "Documento de identidad fiscal", true),
    ("DNI", "Documento Nacional de Identidad", "Documento de identidad para ciudadanos", false),
    ("PASAPORTE", "Pasaporte", "Documento de viaje internacional", false),
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub monedas_created: usize,
    pub tipos_documento_created: usize,
}

pub async fn seed_reference_data<M, T>(
    monedas: &M,
    tipos: &T,
    now: DateTime<Utc>,
) -> CatalogResult<SeedReport>
where
    M: MonedaRepository + Sync,
    T: TipoDocumentoRepository + Sync,
{
    let mut report = SeedReport::default();

    for (codigo, nombre, simbolo) in MONEDAS {
        let codigo = CodigoMoneda::new(codigo)?;
        if monedas.find_by_codigo(&codigo).await?.is_some() {
            continue;
        }
        let fields = MonedaFields::new(codigo, (*nombre).into(), (*simbolo).into())?;
        monedas.create(&fields, now).await?;
        report.monedas_created += 1;
    }

    // Never move the default away from one an operator already chose.
    let mut default_taken = tipos.find_default().await?.is_some();
    for (codigo, nombre, descripcion, es_default) in TIPOS_DOCUMENTO {
        let codigo = CodigoDocumento::new(codigo)?;
        if tipos.find_by_codigo(&codigo).await?.is_some() {
            continue;
        }
        let es_default = *es_default && !default_taken;
        let fields = TipoDocumentoFields::new(
            codigo,
            (*nombre).into(),
            Some((*descripcion).into()),
            es_default,
        )?;
        tipos.create(&fields, now).await?;
        default_taken |= es_default;
        report.tipos_documento_created += 1;
    }

    if report != SeedReport::default() {
        tracing::info!(
            monedas = report.monedas_created,
            tipos_documento = report.tipos_documento_created,
            "Reference data seeded"
        );
    }
    Ok(report)
}
