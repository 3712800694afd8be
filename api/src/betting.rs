use crate::{BettingResult, EnrichedGame, OverUnder};

/// Render a line the way sportsbooks do: "+3.5", "-6.5", "0".
pub fn signed_line(value: f64) -> String {
    if value > 0.0 {
        format!("+{value}")
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Grade a completed game against its spread and total.
///
/// Returns `None` unless both scores are known and the spread and total parse
/// as numbers. The spread is home-relative, so the home side covers when
/// `home + spread > away`; landing exactly on the number goes to the away
/// side. A total equal to the line is reported as under.
pub fn calculate_betting_result(game: &EnrichedGame) -> Option<BettingResult> {
    let home_score = f64::from(game.home_team.score?);
    let away_score = f64::from(game.away_team.score?);
    let spread: f64 = game.spread.trim().parse().ok()?;
    let line: f64 = game.total.trim().parse().ok()?;

    let home_covered = home_score + spread > away_score;
    let (covering_team_code, display_spread) = if home_covered {
        (game.home_team.code.clone(), game.spread.clone())
    } else {
        (game.away_team.code.clone(), signed_line(-spread))
    };

    let over_under = if home_score + away_score > line {
        OverUnder::Over
    } else {
        OverUnder::Under
    };

    Some(BettingResult {
        covering_team_code,
        display_spread,
        over_under,
        total: game.total.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameStatus, TeamView};

    fn final_game(away: u16, home: u16, spread: &str, total: &str) -> EnrichedGame {
        EnrichedGame {
            id: 1,
            status: GameStatus::Post,
            away_team: TeamView { code: "LAL".into(), score: Some(away), ..Default::default() },
            home_team: TeamView { code: "PHX".into(), score: Some(home), ..Default::default() },
            spread: spread.into(),
            total: total.into(),
            ..Default::default()
        }
    }

    #[test]
    fn home_favorite_covers_and_goes_over() {
        let result = calculate_betting_result(&final_game(110, 118, "-4.5", "222.5")).unwrap();
        assert_eq!(result.covering_team_code, "PHX");
        assert_eq!(result.display_spread, "-4.5");
        assert_eq!(result.over_under, OverUnder::Over);
        assert_eq!(result.total, "222.5");
    }

    #[test]
    fn away_dog_covers_shows_flipped_line() {
        let result = calculate_betting_result(&final_game(112, 114, "-6.5", "230")).unwrap();
        assert_eq!(result.covering_team_code, "LAL");
        assert_eq!(result.display_spread, "+6.5");
        assert_eq!(result.over_under, OverUnder::Under);
    }

    #[test]
    fn landing_on_the_number_goes_to_away() {
        let result = calculate_betting_result(&final_game(100, 104, "-4", "204")).unwrap();
        assert_eq!(result.covering_team_code, "LAL");
        assert_eq!(result.display_spread, "+4");
    }

    #[test]
    fn push_on_total_is_under() {
        let result = calculate_betting_result(&final_game(100, 104, "-4", "204")).unwrap();
        assert_eq!(result.over_under, OverUnder::Under);
    }

    #[test]
    fn pick_em_flip_prints_zero() {
        let result = calculate_betting_result(&final_game(101, 99, "0", "200")).unwrap();
        assert_eq!(result.display_spread, "0");
    }

    #[test]
    fn missing_or_malformed_lines_yield_none() {
        assert!(calculate_betting_result(&final_game(100, 104, "", "204")).is_none());
        assert!(calculate_betting_result(&final_game(100, 104, "-4", "")).is_none());
        assert!(calculate_betting_result(&final_game(100, 104, "EVEN", "204")).is_none());

        let mut unplayed = final_game(0, 0, "-4", "204");
        unplayed.home_team.score = None;
        assert!(calculate_betting_result(&unplayed).is_none());
    }

    #[test]
    fn signed_line_formats() {
        assert_eq!(signed_line(6.5), "+6.5");
        assert_eq!(signed_line(-6.5), "-6.5");
        assert_eq!(signed_line(-0.0), "0");
        assert_eq!(signed_line(3.0), "+3");
    }
}
