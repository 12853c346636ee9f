//! PostgreSQL-backed address source.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Postgres};
use tracing::debug;

use super::{AddressSource, AddressWithEntrance, Entrance, RoadNameAddress};
use crate::errors::RebuildError;

/// Records ordered by the full composite key so pages are stable.
const PAGE_QUERY: &str = r#"
    SELECT
        r.address_management_no, r.road_name_code, r.is_basement,
        r.building_main_no, r.building_sub_no,
        r.sido_name, r.sigungu_name, r.legal_emd_name, r.road_name,
        e.address_management_no AS entrance_key,
        e.entrc_point_x, e.entrc_point_y
    FROM road_name_addresses r
    LEFT JOIN road_name_address_entrances e
        ON e.address_management_no = r.address_management_no
        AND e.road_name_code = r.road_name_code
        AND e.is_basement = r.is_basement
        AND e.building_main_no = r.building_main_no
        AND e.building_sub_no = r.building_sub_no
    WHERE r.deleted_at IS NULL
    ORDER BY
        r.address_management_no, r.road_name_code, r.is_basement,
        r.building_main_no, r.building_sub_no
    LIMIT $1 OFFSET $2
"#;

#[derive(sqlx::FromRow)]
struct AddressRow {
    address_management_no: String,
    road_name_code: String,
    is_basement: String,
    building_main_no: i32,
    building_sub_no: i32,
    sido_name: Option<String>,
    sigungu_name: Option<String>,
    legal_emd_name: Option<String>,
    road_name: Option<String>,
    entrance_key: Option<String>,
    entrc_point_x: Option<f64>,
    entrc_point_y: Option<f64>,
}

impl From<AddressRow> for AddressWithEntrance {
    fn from(row: AddressRow) -> Self {
        let entrance = row.entrance_key.map(|_| Entrance {
            x: row.entrc_point_x,
            y: row.entrc_point_y,
        });

        Self {
            address: RoadNameAddress {
                address_management_no: row.address_management_no,
                road_name_code: row.road_name_code,
                is_basement: row.is_basement,
                building_main_no: row.building_main_no,
                building_sub_no: row.building_sub_no,
                sido_name: row.sido_name,
                sigungu_name: row.sigungu_name,
                legal_emd_name: row.legal_emd_name,
                road_name: row.road_name,
            },
            entrance,
        }
    }
}

pub struct PostgresAddressSource {
    pool: sqlx::Pool<Postgres>,
}

impl PostgresAddressSource {
    pub async fn new(database_url: &str) -> Result<Self, RebuildError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl AddressSource for PostgresAddressSource {
    async fn page(&self, offset: u64, limit: u64) -> Result<Vec<AddressWithEntrance>, RebuildError> {
        let rows = sqlx::query_as::<_, AddressRow>(PAGE_QUERY)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        debug!(offset = offset, limit = limit, rows = rows.len(), "Read address page");
        Ok(rows.into_iter().map(AddressWithEntrance::from).collect())
    }
}
