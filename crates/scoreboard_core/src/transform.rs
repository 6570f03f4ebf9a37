use time::PrimitiveDateTime;

use crate::error::TransformError;
use crate::schema::{
    DEFAULT_IMAGE_PATH, DEFAULT_THUMBNAIL_PATH, ScoreRows, ServiceRow, Snapshot, TeamEntry, TeamRow,
};

pub fn parse_snapshot(body: &[u8]) -> Result<Snapshot, TransformError> {
    Ok(serde_json::from_slice(body)?)
}

/// Reshapes one snapshot into team and service rows, in source order.
///
/// `recorded_at` is stamped on every row. A service whose status code has no
/// label in `status-descriptions` fails the whole transform.
pub fn transform(
    snapshot: &Snapshot,
    recorded_at: PrimitiveDateTime,
) -> Result<ScoreRows, TransformError> {
    let tick = snapshot.tick;

    let teams = snapshot
        .teams
        .iter()
        .map(|team| team_row(team, tick, recorded_at))
        .collect();

    let service_count = snapshot.teams.iter().map(|team| team.services.len()).sum();
    let mut services = Vec::with_capacity(service_count);
    for team in &snapshot.teams {
        for (index, service) in team.services.iter().enumerate() {
            let service_index = i32::try_from(index)
                .map_err(|_| TransformError::IndexOverflow { team_id: team.id })?;
            let status_description = snapshot
                .status_descriptions
                .get(&service.status.to_string())
                .ok_or(TransformError::UnknownStatus {
                    team_id: team.id,
                    service_index: index,
                    status: service.status,
                })?;

            services.push(ServiceRow {
                team_id: team.id,
                service_index,
                status: service.status,
                status_description: status_description.clone(),
                offense: service.offense,
                defense: service.defense,
                sla: service.sla,
                tick,
                recorded_at,
            });
        }
    }

    Ok(ScoreRows {
        tick,
        recorded_at,
        teams,
        services,
    })
}

fn team_row(team: &TeamEntry, tick: i32, recorded_at: PrimitiveDateTime) -> TeamRow {
    TeamRow {
        team_id: team.id,
        name: team.name.clone(),
        rank: team.rank,
        total_offense: team.offense,
        total_defense: team.defense,
        total_sla: team.sla,
        total_score: team.total,
        image_path: team
            .image
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE_PATH.to_string()),
        thumbnail_path: team
            .thumbnail
            .clone()
            .unwrap_or_else(|| DEFAULT_THUMBNAIL_PATH.to_string()),
        tick,
        recorded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use time::macros::datetime;

    fn snapshot(value: serde_json::Value) -> Snapshot {
        serde_json::from_value(value).unwrap()
    }

    const RECORDED_AT: PrimitiveDateTime = datetime!(2024-11-02 18:00:00);

    #[fixture]
    fn recorded_at() -> PrimitiveDateTime {
        RECORDED_AT
    }

    #[fixture]
    fn scoreboard() -> Snapshot {
        snapshot(json!({
            "tick": 42,
            "teams": [
                {
                    "id": 7, "name": "Shellphish", "rank": 2,
                    "offense": 120.5, "defense": 30.0, "sla": 0.75, "total": 151.25,
                    "image": "/uploads/team-images/7.png",
                    "thumbnail": "/uploads/team-images/thumbnails/7.png",
                    "services": [
                        {"status": 0, "offense": 60.0, "defense": 10.0, "sla": 1.0},
                        {"status": 1, "offense": 60.5, "defense": 20.0, "sla": 0.5},
                        {"status": 0, "offense": 0.0, "defense": 0.0, "sla": 0.75}
                    ]
                },
                {
                    "id": 3, "name": "Tea Deliverers", "rank": 1,
                    "offense": 200, "defense": 50, "sla": 1.0, "total": 251,
                    "services": [
                        {"status": 2, "offense": 200, "defense": 50, "sla": 1.0}
                    ]
                },
                {
                    "id": 9, "name": "No Services", "rank": 3,
                    "offense": 0, "defense": 0, "sla": 0, "total": 0,
                    "services": []
                }
            ],
            "status-descriptions": {"0": "up", "1": "down", "2": "faulty"}
        }))
    }

    #[test]
    fn single_team_scenario() {
        let input = snapshot(json!({
            "tick": 5,
            "teams": [{
                "id": 1, "name": "A", "rank": 1,
                "offense": 10, "defense": 5, "sla": 1.0, "total": 16,
                "services": [{"status": 0, "offense": 10, "defense": 5, "sla": 1.0}]
            }],
            "status-descriptions": {"0": "UP"}
        }));
        let at = RECORDED_AT;

        let rows = transform(&input, at).unwrap();

        assert_eq!(
            rows.teams,
            vec![TeamRow {
                team_id: 1,
                name: "A".to_string(),
                rank: 1,
                total_offense: 10.0,
                total_defense: 5.0,
                total_sla: 1.0,
                total_score: 16.0,
                image_path: DEFAULT_IMAGE_PATH.to_string(),
                thumbnail_path: DEFAULT_THUMBNAIL_PATH.to_string(),
                tick: 5,
                recorded_at: at,
            }]
        );
        assert_eq!(
            rows.services,
            vec![ServiceRow {
                team_id: 1,
                service_index: 0,
                status: 0,
                status_description: "UP".to_string(),
                offense: 10.0,
                defense: 5.0,
                sla: 1.0,
                tick: 5,
                recorded_at: at,
            }]
        );
    }

    #[rstest]
    fn row_counts_follow_the_snapshot(scoreboard: Snapshot, recorded_at: PrimitiveDateTime) {
        let rows = transform(&scoreboard, recorded_at).unwrap();
        assert_eq!(rows.teams.len(), 3);
        assert_eq!(rows.services.len(), 4);
    }

    #[rstest]
    fn every_row_shares_tick_and_timestamp(scoreboard: Snapshot, recorded_at: PrimitiveDateTime) {
        let rows = transform(&scoreboard, recorded_at).unwrap();
        assert_eq!(rows.tick, 42);
        assert_eq!(rows.recorded_at, recorded_at);
        assert!(
            rows.teams
                .iter()
                .all(|row| row.tick == 42 && row.recorded_at == recorded_at)
        );
        assert!(
            rows.services
                .iter()
                .all(|row| row.tick == 42 && row.recorded_at == recorded_at)
        );
    }

    #[rstest]
    fn order_and_service_index_follow_the_source(
        scoreboard: Snapshot,
        recorded_at: PrimitiveDateTime,
    ) {
        let rows = transform(&scoreboard, recorded_at).unwrap();
        let team_ids: Vec<i32> = rows.teams.iter().map(|row| row.team_id).collect();
        assert_eq!(team_ids, vec![7, 3, 9]);

        let keys: Vec<(i32, i32)> = rows
            .services
            .iter()
            .map(|row| (row.team_id, row.service_index))
            .collect();
        assert_eq!(keys, vec![(7, 0), (7, 1), (7, 2), (3, 0)]);
    }

    #[rstest]
    fn provided_images_are_kept_verbatim(scoreboard: Snapshot, recorded_at: PrimitiveDateTime) {
        let rows = transform(&scoreboard, recorded_at).unwrap();
        assert_eq!(rows.teams[0].image_path, "/uploads/team-images/7.png");
        assert_eq!(
            rows.teams[0].thumbnail_path,
            "/uploads/team-images/thumbnails/7.png"
        );
        assert_eq!(rows.teams[1].image_path, DEFAULT_IMAGE_PATH);
        assert_eq!(rows.teams[1].thumbnail_path, DEFAULT_THUMBNAIL_PATH);
    }

    #[rstest]
    fn status_labels_come_from_the_snapshot(scoreboard: Snapshot, recorded_at: PrimitiveDateTime) {
        let rows = transform(&scoreboard, recorded_at).unwrap();
        let labels: Vec<&str> = rows
            .services
            .iter()
            .map(|row| row.status_description.as_str())
            .collect();
        assert_eq!(labels, vec!["up", "down", "up", "faulty"]);
    }

    #[rstest]
    fn unknown_status_fails(mut scoreboard: Snapshot, recorded_at: PrimitiveDateTime) {
        scoreboard.teams[0].services[1].status = 4;

        let err = transform(&scoreboard, recorded_at).unwrap_err();

        assert!(matches!(
            err,
            TransformError::UnknownStatus {
                team_id: 7,
                service_index: 1,
                status: 4
            }
        ));
    }

    #[rstest]
    fn input_is_left_untouched(scoreboard: Snapshot, recorded_at: PrimitiveDateTime) {
        let before = format!("{scoreboard:?}");
        transform(&scoreboard, recorded_at).unwrap();
        assert_eq!(format!("{scoreboard:?}"), before);
    }

    #[rstest]
    #[case::missing_tick(r#"{"teams": [], "status-descriptions": {}}"#)]
    #[case::missing_descriptions(r#"{"tick": 1, "teams": []}"#)]
    #[case::missing_team_field(
        r#"{"tick": 1, "teams": [{"id": 1, "name": "A", "rank": 1, "services": []}],
            "status-descriptions": {}}"#
    )]
    #[case::not_json("<html>502 Bad Gateway</html>")]
    fn malformed_snapshot_is_rejected(#[case] body: &str) {
        let err = parse_snapshot(body.as_bytes()).unwrap_err();
        assert!(matches!(err, TransformError::Malformed(_)));
    }

    #[test]
    fn empty_team_list_yields_no_rows() {
        let input =
            parse_snapshot(br#"{"tick": 1, "teams": [], "status-descriptions": {"0": "up"}}"#)
                .unwrap();
        let rows = transform(&input, RECORDED_AT).unwrap();
        assert!(rows.teams.is_empty());
        assert!(rows.services.is_empty());
        assert_eq!(rows.tick, 1);
    }
}
