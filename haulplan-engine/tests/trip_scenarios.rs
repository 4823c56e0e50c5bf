use haulplan_engine::{
    DutyStatus, HosRules, InputError, Planner, PlanningError, ScheduleResult, ShiftEndReason,
    TimelineEntry, Trigger, TripInput, plan, plan_with_rules,
};

fn shift_ends(input: &TripInput) -> Vec<ShiftEndReason> {
    Planner::default()
        .steps(input)
        .unwrap()
        .map(Result::unwrap)
        .filter_map(|step| match step.trigger {
            Some(Trigger::ShiftEnd(reason)) => Some(reason),
            _ => None,
        })
        .collect()
}

fn total_driving(result: &ScheduleResult) -> f64 {
    result.days.iter().map(|day| day.totals.driving).sum()
}

fn on_duty_entries(result: &ScheduleResult) -> Vec<(u32, &TimelineEntry)> {
    result
        .days
        .iter()
        .flat_map(|day| {
            day.timeline
                .iter()
                .filter(|entry| entry.status == DutyStatus::OnDuty)
                .map(move |entry| (day.day_num, entry))
        })
        .collect()
}

#[test]
fn short_haul_fits_in_one_day() {
    let result = plan(&TripInput::new(300.0, 0.0)).unwrap();
    let stats = &result.trip_stats;
    assert_eq!(stats.trip_days, 1);
    assert_eq!(stats.fuel_stops, 0);
    assert!(result.fuel_stops.is_empty());
    assert!(result.rest_stops.is_empty());
    assert!((result.days[0].totals.driving - 5.4545).abs() < 1e-3);
    assert!((stats.total_driving_hrs - 300.0 / 55.0).abs() < 1e-9);
    assert!((result.days[0].logged_hours() - 24.0).abs() < 1e-9);
}

#[test]
fn two_shift_trip_takes_one_break_and_one_reset() {
    let input = TripInput::new(855.0, 14.0);
    let result = plan(&input).unwrap();
    assert_eq!(result.trip_stats.trip_days, 2);
    assert_eq!(result.trip_stats.fuel_stops, 0);
    assert_eq!(result.rest_stops.len(), 1);
    assert!((total_driving(&result) - 15.545_454).abs() < 1e-3);

    let rest = &result.rest_stops[0];
    assert_eq!(rest.day, 1);
    assert!((rest.elapsed_hour_in_day - 15.0).abs() < 1e-9);
    assert_eq!(rest.time_str, "3:00 PM");
    assert!((rest.miles_in - 440.0).abs() < 1e-9);

    assert_eq!(shift_ends(&input), [ShiftEndReason::DrivingLimit]);

    let day_one = &result.days[0];
    assert!((day_one.totals.driving - 11.0).abs() < 1e-9);
    assert!((day_one.driven_miles - 605.0).abs() < 1e-6);
    assert!((result.days[1].driven_miles - 250.0).abs() < 1e-6);
}

#[test]
fn twelve_hundred_miles_refuels_once_at_one_thousand() {
    let input = TripInput::new(1_200.0, 0.0);
    let result = plan(&input).unwrap();
    assert_eq!(result.fuel_stops.len(), 1);
    assert_eq!(result.trip_stats.fuel_stops, 1);
    let fuel = &result.fuel_stops[0];
    assert!((fuel.miles_in - 1_000.0).abs() < 1e-6);
    assert_eq!(fuel.day, 2);
    assert!(!shift_ends(&input).is_empty());
    assert_eq!(result.rest_stops.len(), 2);
}

#[test]
fn exhausted_cycle_is_reported_not_scheduled() {
    let err = plan(&TripInput::new(2_000.0, 68.0)).unwrap_err();
    match err {
        PlanningError::CycleExceeded {
            day,
            cycle_hours,
            limit,
            ..
        } => {
            assert_eq!(day, 1);
            assert!(cycle_hours > limit);
            assert!((limit - 70.0).abs() < f64::EPSILON);
        }
        other => panic!("expected cycle exhaustion, got {other:?}"),
    }
}

#[test]
fn cycle_hours_over_limit_are_invalid_input() {
    let err = plan(&TripInput::new(500.0, 71.0)).unwrap_err();
    assert!(err.is_user_correctable());
    assert_eq!(
        err,
        PlanningError::InvalidInput(InputError::CycleOutOfRange {
            value: 71.0,
            limit: 70.0
        })
    );
    assert!(matches!(
        plan(&TripInput::new(-5.0, 0.0)),
        Err(PlanningError::InvalidInput(InputError::NonPositiveDistance(_)))
    ));
}

#[test]
fn sub_epsilon_distance_is_invalid_input() {
    let err = plan(&TripInput::new(5e-7, 0.0)).unwrap_err();
    assert!(err.is_user_correctable());
    assert!(matches!(
        err,
        PlanningError::InvalidInput(InputError::NonPositiveDistance(_))
    ));
    assert!(plan(&TripInput::new(1.0, 0.0)).is_ok());
}

#[test]
fn handling_longer_than_the_duty_window_is_invalid_input() {
    let err = plan(&TripInput::new(300.0, 0.0).with_handling(15.0, 1.0)).unwrap_err();
    assert!(err.is_user_correctable());
    assert_eq!(
        err,
        PlanningError::InvalidInput(InputError::HandlingExceedsWindow {
            field: "pickup_hrs",
            value: 15.0,
            limit: 14.0,
        })
    );

    let err = plan(&TripInput::new(300.0, 0.0).with_handling(1.0, 14.5)).unwrap_err();
    assert!(matches!(
        err,
        PlanningError::InvalidInput(InputError::HandlingExceedsWindow {
            field: "dropoff_hrs",
            ..
        })
    ));
}

#[test]
fn pickup_and_dropoff_bookend_the_trip() {
    for miles in [120.0, 855.0, 1_200.0, 2_600.0] {
        let result = plan(&TripInput::new(miles, 0.0)).unwrap();
        let entries = on_duty_entries(&result);
        let (first_day, pickup) = entries.first().copied().unwrap();
        let (last_day, dropoff) = entries.last().copied().unwrap();
        assert_eq!(first_day, 1);
        assert_eq!(pickup.note.as_deref(), Some("Pickup"));
        assert!((pickup.duration() - 1.0).abs() < 1e-9);
        assert_eq!(last_day, result.trip_stats.trip_days);
        assert_eq!(dropoff.note.as_deref(), Some("Dropoff"));
        assert!((dropoff.duration() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn destination_on_a_fuel_boundary_skips_the_final_stop() {
    let result = plan(&TripInput::new(2_000.0, 0.0)).unwrap();
    assert_eq!(result.fuel_stops.len(), 1);
    assert!((result.fuel_stops[0].miles_in - 1_000.0).abs() < 1e-6);

    let result = plan(&TripInput::new(3_000.0, 0.0)).unwrap();
    let miles: Vec<_> = result.fuel_stops.iter().map(|stop| stop.miles_in).collect();
    assert_eq!(miles.len(), 2);
    assert!((miles[0] - 1_000.0).abs() < 1e-6);
    assert!((miles[1] - 2_000.0).abs() < 1e-6);
}

#[test]
fn dropoff_past_the_window_waits_for_a_reset() {
    let rules = HosRules {
        duty_window_hrs: 12.6,
        ..HosRules::default()
    };
    let result = plan_with_rules(&TripInput::new(605.0, 0.0), &rules).unwrap();
    assert_eq!(result.trip_stats.trip_days, 2);
    let entries = on_duty_entries(&result);
    let (day, dropoff) = entries.last().copied().unwrap();
    assert_eq!(day, 2);
    assert!((dropoff.start - 4.5).abs() < 1e-9);
}

#[test]
fn sleeper_resets_are_logged_on_the_sleeper_row() {
    let rules = HosRules {
        reset_status: DutyStatus::Sleeper,
        ..HosRules::default()
    };
    let result = plan_with_rules(&TripInput::new(1_200.0, 0.0), &rules).unwrap();
    let sleeper: f64 = result.days.iter().map(|day| day.totals.sleeper).sum();
    assert!((sleeper - 10.0).abs() < 1e-9);
}

#[test]
fn midnight_start_and_custom_speed() {
    let input = TripInput::new(500.0, 0.0)
        .with_start_hour(0.0)
        .with_avg_speed(50.0);
    let result = plan(&input).unwrap();
    let first = &result.days[0].timeline[0];
    assert_eq!(first.status, DutyStatus::OnDuty);
    assert!(first.start.abs() < f64::EPSILON);
    assert!((total_driving(&result) - 10.0).abs() < 1e-9);
    assert_eq!(result.rest_stops.len(), 1);
    assert!((result.trip_stats.avg_speed_mph - 50.0).abs() < f64::EPSILON);
}

#[test]
fn every_full_day_accounts_for_twenty_four_hours() {
    let result = plan(&TripInput::new(2_600.0, 5.0)).unwrap();
    for day in &result.days {
        assert!(
            (day.logged_hours() - 24.0).abs() < 1e-6,
            "day {} logs {}",
            day.day_num,
            day.logged_hours()
        );
    }
    let last = result.days.last().unwrap();
    assert!((last.cumulative_miles - 2_600.0).abs() < 1e-6);
    assert!(last.recap.cycle_used <= 70.0);
    assert!((last.recap.cycle_available - result.trip_stats.cycle_remaining).abs() < 1e-9);
}
