//! Role to permission table.
//!
//! Permission strings are `"<resource>:<action>"`. The table is a static
//! match, so there is nothing to initialise or mutate at runtime. Superuser
//! and enabled-status checks belong to
//! [`Usuario::has_permission`](crate::domain::entity::Usuario::has_permission).

use crate::domain::value_object::Role;

pub const USUARIOS_READ: &str = "usuarios:read";
pub const USUARIOS_WRITE: &str = "usuarios:write";
pub const USUARIOS_MANAGE_ROLES: &str = "usuarios:manage_roles";
pub const USUARIOS_MANAGE_SUPERUSERS: &str = "usuarios:manage_superusers";

const ADMIN: &[&str] = &[
    "aseguradoras:read",
    "aseguradoras:write",
    "clientes:read",
    "clientes:write",
    "clientes:view_all",
    "corredores:read",
    "corredores:write",
    "monedas:read",
    "monedas:write",
    "polizas:read",
    "polizas:write",
    "tipos_documento:read",
    "tipos_documento:write",
    "tipos_seguros:read",
    "tipos_seguros:write",
    USUARIOS_READ,
    USUARIOS_WRITE,
    USUARIOS_MANAGE_ROLES,
    USUARIOS_MANAGE_SUPERUSERS,
];

const CORREDOR: &[&str] = &[
    "aseguradoras:read",
    "clientes:read",
    "clientes:write",
    "monedas:read",
    "polizas:read",
    "polizas:write",
    "tipos_documento:read",
    "tipos_seguros:read",
];

const ASISTENTE: &[&str] = &[
    "aseguradoras:read",
    "clientes:read",
    "monedas:read",
    "polizas:read",
    "tipos_documento:read",
    "tipos_seguros:read",
];

pub const fn permissions_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ADMIN,
        Role::Corredor => CORREDOR,
        Role::Asistente => ASISTENTE,
    }
}

#[inline]
pub fn has_permission(role: Role, permission: &str) -> bool {
    permissions_for(role).contains(&permission)
}
