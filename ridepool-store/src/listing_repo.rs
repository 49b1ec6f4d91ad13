use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ridepool_core::listing::{RecurringData, RequestStatus, Ride, RidePatch, RideRequest, RideRequestPatch, RideStatus};
use ridepool_core::repository::{ListingRepository, RepoError, RepoResult};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

const RIDE_COLUMNS: &str = "id, driver_id, from_location, to_location, departure_date, departure_time, \
     available_seats, price, external_ride_code, is_recurring, recurring_data, requested_by, status, created_at";

const REQUEST_COLUMNS: &str = "id, rider_id, from_location, to_location, departure_date, departure_time, \
     passengers, max_price, status, created_at";

pub struct StoreListingRepository {
    pool: PgPool,
}

impl StoreListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct RideRow {
    id: Uuid,
    driver_id: Uuid,
    from_location: String,
    to_location: String,
    departure_date: Option<String>,
    departure_time: String,
    available_seats: i32,
    price: i32,
    external_ride_code: Option<String>,
    is_recurring: bool,
    recurring_data: Option<Json<RecurringData>>,
    requested_by: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = RepoError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        Ok(Ride {
            id: row.id,
            driver_id: row.driver_id,
            from_location: row.from_location,
            to_location: row.to_location,
            departure_date: row.departure_date,
            departure_time: row.departure_time,
            available_seats: row.available_seats,
            price: row.price,
            external_ride_code: row.external_ride_code,
            is_recurring: row.is_recurring,
            recurring_data: row.recurring_data.map(|Json(data)| data),
            requested_by: row.requested_by,
            status: row.status.parse::<RideStatus>()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    rider_id: Uuid,
    from_location: String,
    to_location: String,
    departure_date: Option<String>,
    departure_time: String,
    passengers: i32,
    max_price: Option<i32>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for RideRequest {
    type Error = RepoError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(RideRequest {
            id: row.id,
            rider_id: row.rider_id,
            from_location: row.from_location,
            to_location: row.to_location,
            departure_date: row.departure_date,
            departure_time: row.departure_time,
            passengers: row.passengers,
            max_price: row.max_price,
            status: row.status.parse::<RequestStatus>()?,
            created_at: row.created_at,
        })
    }
}

fn rides_from(rows: Vec<RideRow>) -> RepoResult<Vec<Ride>> {
    rows.into_iter().map(Ride::try_from).collect()
}

fn requests_from(rows: Vec<RequestRow>) -> RepoResult<Vec<RideRequest>> {
    rows.into_iter().map(RideRequest::try_from).collect()
}

#[async_trait]
impl ListingRepository for StoreListingRepository {
    async fn create_ride(&self, ride: &Ride) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rides (id, driver_id, from_location, to_location, departure_date, departure_time,
                               available_seats, price, external_ride_code, is_recurring, recurring_data,
                               requested_by, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(ride.id)
        .bind(ride.driver_id)
        .bind(&ride.from_location)
        .bind(&ride.to_location)
        .bind(&ride.departure_date)
        .bind(&ride.departure_time)
        .bind(ride.available_seats)
        .bind(ride.price)
        .bind(&ride.external_ride_code)
        .bind(ride.is_recurring)
        .bind(ride.recurring_data.clone().map(Json))
        .bind(ride.requested_by)
        .bind(ride.status.as_str())
        .bind(ride.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_ride(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        let row: Option<RideRow> = sqlx::query_as(&format!("SELECT {} FROM rides WHERE id = $1", RIDE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Ride::try_from).transpose()
    }

    async fn list_active_rides(&self) -> RepoResult<Vec<Ride>> {
        let rows: Vec<RideRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rides WHERE status = $1 ORDER BY created_at DESC",
            RIDE_COLUMNS
        ))
        .bind(RideStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        rides_from(rows)
    }

    async fn list_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>> {
        let rows: Vec<RideRow> = sqlx::query_as(&format!(
            "SELECT {} FROM rides WHERE driver_id = $1 ORDER BY created_at DESC",
            RIDE_COLUMNS
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;
        rides_from(rows)
    }

    async fn update_ride(&self, id: Uuid, patch: RidePatch) -> RepoResult<Option<Ride>> {
        let row: Option<RideRow> = sqlx::query_as(&format!(
            r#"
            UPDATE rides
            SET status = COALESCE($2, status),
                external_ride_code = COALESCE(external_ride_code, $3)
            WHERE id = $1
            RETURNING {}
            "#,
            RIDE_COLUMNS
        ))
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.external_ride_code)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Ride::try_from).transpose()
    }

    async fn delete_ride(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_request(&self, request: &RideRequest) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ride_requests (id, rider_id, from_location, to_location, departure_date, departure_time,
                                       passengers, max_price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id)
        .bind(request.rider_id)
        .bind(&request.from_location)
        .bind(&request.to_location)
        .bind(&request.departure_date)
        .bind(&request.departure_time)
        .bind(request.passengers)
        .bind(request.max_price)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> RepoResult<Option<RideRequest>> {
        let row: Option<RequestRow> =
            sqlx::query_as(&format!("SELECT {} FROM ride_requests WHERE id = $1", REQUEST_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(RideRequest::try_from).transpose()
    }

    async fn list_active_requests(&self) -> RepoResult<Vec<RideRequest>> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ride_requests WHERE status = $1 ORDER BY created_at DESC",
            REQUEST_COLUMNS
        ))
        .bind(RequestStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        requests_from(rows)
    }

    async fn list_requests_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<RideRequest>> {
        let rows: Vec<RequestRow> = sqlx::query_as(&format!(
            "SELECT {} FROM ride_requests WHERE rider_id = $1 ORDER BY created_at DESC",
            REQUEST_COLUMNS
        ))
        .bind(rider_id)
        .fetch_all(&self.pool)
        .await?;
        requests_from(rows)
    }

    async fn update_request(&self, id: Uuid, patch: RideRequestPatch) -> RepoResult<Option<RideRequest>> {
        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "UPDATE ride_requests SET status = COALESCE($2, status) WHERE id = $1 RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;
        row.map(RideRequest::try_from).transpose()
    }

    async fn delete_request(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM ride_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
