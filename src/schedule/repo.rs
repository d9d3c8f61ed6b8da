use anyhow::Context;
use lazy_static::lazy_static;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::grid::{cells, column_name, ScheduleGrid};

lazy_static! {
    static ref COLUMNS: Vec<String> = cells().map(|(d, s)| column_name(d, s)).collect();
    static ref SELECT_SQL: String = format!(
        "SELECT {} FROM measurement_schedules WHERE user_id = $1",
        COLUMNS.join(", ")
    );
    static ref UPSERT_SQL: String = {
        let placeholders: Vec<String> = (2..=COLUMNS.len() + 1).map(|i| format!("${i}")).collect();
        let updates: Vec<String> = COLUMNS.iter().map(|c| format!("{c} = EXCLUDED.{c}")).collect();
        format!(
            "INSERT INTO measurement_schedules (user_id, {}) VALUES ($1, {}) \
             ON CONFLICT (user_id) DO UPDATE SET {}",
            COLUMNS.join(", "),
            placeholders.join(", "),
            updates.join(", ")
        )
    };
}

/// Stored schedule, all off when the user never saved one.
pub async fn get(db: &PgPool, user_id: Uuid) -> anyhow::Result<ScheduleGrid> {
    let Some(row) = sqlx::query(&SELECT_SQL)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("load schedule")?
    else {
        return Ok(ScheduleGrid::default());
    };

    let mut grid = ScheduleGrid::default();
    for (day, slot) in cells() {
        let on: bool = row
            .try_get(column_name(day, slot).as_str())
            .with_context(|| format!("read schedule column {}", column_name(day, slot)))?;
        grid.set(day, slot, on);
    }
    Ok(grid)
}

pub async fn upsert(db: &PgPool, user_id: Uuid, grid: &ScheduleGrid) -> anyhow::Result<()> {
    let mut q = sqlx::query(&UPSERT_SQL).bind(user_id);
    for (day, slot) in cells() {
        q = q.bind(grid.get(day, slot));
    }
    q.execute(db).await.context("save schedule")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_binds_one_placeholder_per_column() {
        assert!(UPSERT_SQL.contains("$50)"));
        assert!(!UPSERT_SQL.contains("$51"));
        assert!(UPSERT_SQL.contains("sunday_bedtime = EXCLUDED.sunday_bedtime"));
        assert!(SELECT_SQL.starts_with("SELECT monday_pre_breakfast, monday_post_breakfast"));
    }
}
