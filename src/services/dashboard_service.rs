// src/services/dashboard_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::dashboard::{DashboardSummary, ProductionChartEntry, TopProductEntry},
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        self.repo.get_summary(executor, empresa_id).await
    }

    pub async fn get_production_chart<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<Vec<ProductionChartEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_production_last_30_days(executor, empresa_id).await
    }

    pub async fn get_top_products<'e, E>(
        &self,
        executor: E,
        empresa_id: Uuid,
    ) -> Result<Vec<TopProductEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_top_products(executor, empresa_id).await
    }
}
