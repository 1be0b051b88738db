// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::empresa::{EmpresaMembro, PapelMembro},
};

/// 1. O Trait que define o papel mínimo exigido
pub trait RoleDef: Send + Sync + 'static {
    fn minimo() -> PapelMembro;
}

/// 2. O Extractor (Guardião). Depende do vínculo que o `tenant_guard` deixou nos extensions.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let membro = parts
            .extensions
            .get::<EmpresaMembro>()
            .ok_or(AppError::TenantAccessDenied)?;

        check_papel(membro.papel, T::minimo())?;
        Ok(RequireRole(PhantomData))
    }
}

pub fn check_papel(atual: PapelMembro, minimo: PapelMembro) -> Result<(), AppError> {
    if atual >= minimo {
        Ok(())
    } else {
        Err(AppError::ForbiddenRole(minimo.as_str()))
    }
}

// ---
// PAPÉIS EXIGIDOS (TIPOS)
// ---

pub struct Admin;
impl RoleDef for Admin {
    fn minimo() -> PapelMembro { PapelMembro::Admin }
}

pub struct Gestor;
impl RoleDef for Gestor {
    fn minimo() -> PapelMembro { PapelMembro::Gestor }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_roles_satisfy_lower_requirements() {
        assert!(check_papel(PapelMembro::Admin, PapelMembro::Gestor).is_ok());
        assert!(check_papel(PapelMembro::Gestor, PapelMembro::Gestor).is_ok());
    }

    #[test]
    fn operador_cannot_act_as_gestor() {
        assert!(matches!(
            check_papel(PapelMembro::Operador, PapelMembro::Gestor),
            Err(AppError::ForbiddenRole("GESTOR"))
        ));
        assert!(check_papel(PapelMembro::Gestor, PapelMembro::Admin).is_err());
    }
}
