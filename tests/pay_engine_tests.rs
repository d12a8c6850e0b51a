use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, Utc};
use pretty_assertions::assert_eq;
use std::str::FromStr;
use uuid::Uuid;

use techtrackr_be::database::models::{
    BillingType, Job, JobStatus, MileageRate, Technician, TechnicianStatus, TimeEntry,
    TimeEntryStatus,
};
use techtrackr_be::services::pay::{PayConfig, PayError, compute_job_pay};
use techtrackr_be::services::reports::build_payroll_report;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::from_str(s).unwrap()
}

fn flat_rate_job(billing: Option<&str>, expenses: &str, commissions: &str) -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::new_v4(),
        platform_id: Uuid::new_v4(),
        platform_job_code: None,
        ticket_number: Some("WO-18164666".to_string()),
        description: "Field service repair".to_string(),
        client_name: Some("Pro-Vigil".to_string()),
        location: None,
        billing_type: BillingType::FlatRate,
        billing_amount: billing.map(dec),
        estimated_hours: None,
        expenses: dec(expenses),
        commissions: dec(commissions),
        job_status: JobStatus::Completed,
        job_date: Some(date("2026-01-10")),
        external_url: None,
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

fn tech(name: &str, min_rate: &str) -> Technician {
    let now = Utc::now();
    Technician {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: None,
        phone: None,
        hourly_rate: dec(min_rate),
        status: TechnicianStatus::Active,
        hire_date: None,
        created_at: now,
        updated_at: now,
    }
}

fn verified_entry(job_id: Uuid, tech_id: Uuid, hours: &str, worked: &str) -> TimeEntry {
    let now = Utc::now();
    TimeEntry {
        id: Uuid::new_v4(),
        job_id,
        tech_id: Some(tech_id),
        period_id: None,
        date_worked: date(worked),
        time_in: None,
        time_out: None,
        hours_worked: Some(dec(hours)),
        mileage: BigDecimal::zero(),
        per_diem: BigDecimal::zero(),
        personal_expenses: BigDecimal::zero(),
        status: TimeEntryStatus::Verified,
        rejection_reason: None,
        notes: None,
        verified_by: None,
        verified_at: None,
        created_by: None,
        updated_by: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn scenario_single_tech_above_floor() {
    // billing $1000, expenses $100 -> net $900, pool $450.
    // One tech, 10 hours, $20/hr minimum: $45/hr calculated beats the floor.
    let job = flat_rate_job(Some("1000"), "100", "0");
    let alice = tech("Alice", "20");
    let entries = vec![verified_entry(job.id, alice.id, "10", "2026-01-10")];

    let result =
        compute_job_pay(&job, &entries, &[alice], &[], &PayConfig::default()).unwrap();

    assert_eq!(result.job_net, dec("900.00"));
    assert_eq!(result.tech_pool, dec("450.00"));

    let row = &result.technicians[0];
    assert_eq!(row.base_pay, dec("450.00"));
    assert_eq!(row.effective_rate, dec("45.00"));
    assert!(!row.using_minimum);
}

#[test]
fn scenario_floor_guarantees_minimum_without_renormalizing() {
    // Same job, 8h + 2h split. Bob's $60/hr floor beats his $90 share;
    // Alice stays at her unfloored $360.
    let job = flat_rate_job(Some("1000"), "100", "0");
    let alice = tech("Alice", "20");
    let bob = tech("Bob", "60");
    let entries = vec![
        verified_entry(job.id, alice.id, "8", "2026-01-10"),
        verified_entry(job.id, bob.id, "2", "2026-01-11"),
    ];

    let result = compute_job_pay(
        &job,
        &entries,
        &[alice.clone(), bob.clone()],
        &[],
        &PayConfig::default(),
    )
    .unwrap();

    let alice_row = result
        .technicians
        .iter()
        .find(|t| t.tech_id == alice.id)
        .unwrap();
    let bob_row = result
        .technicians
        .iter()
        .find(|t| t.tech_id == bob.id)
        .unwrap();

    assert_eq!(alice_row.base_pay, dec("360.00"));
    assert_eq!(alice_row.effective_rate, dec("45.00"));
    assert!(!alice_row.using_minimum);

    assert_eq!(bob_row.base_pay, dec("120.00"));
    assert!(bob_row.using_minimum);
}

#[test]
fn missing_billing_is_fatal_for_that_job_only() {
    let good = flat_rate_job(Some("600"), "0", "0");
    let bad = flat_rate_job(None, "0", "0");
    let alice = tech("Alice", "15");
    let techs = [alice.clone()];

    let good_entries = vec![verified_entry(good.id, alice.id, "6", "2026-01-12")];
    let bad_entries = vec![verified_entry(bad.id, alice.id, "4", "2026-01-13")];

    let good_result =
        compute_job_pay(&good, &good_entries, &techs, &[], &PayConfig::default());
    let bad_result = compute_job_pay(&bad, &bad_entries, &techs, &[], &PayConfig::default());

    assert!(good_result.is_ok());
    assert_eq!(bad_result.unwrap_err(), PayError::IncompleteJobData(bad.id));
}

#[test]
fn payroll_grand_totals_reconcile_exactly() {
    // Numbers chosen so proportional splits produce repeating decimals;
    // the grand totals must still equal the per-technician sums exactly,
    // because everything is summed from rounded rows.
    let alice = tech("Alice", "22");
    let bob = tech("Bob", "31");
    let carol = tech("Carol", "18");
    let techs = vec![alice.clone(), bob.clone(), carol.clone()];

    let mut priced = Vec::new();
    for (billing, hours) in [
        ("997.77", ["3.33", "2.22", "1.11"]),
        ("1234.56", ["7.5", "0.25", "4.4"]),
        ("250.01", ["1", "1", "1"]),
    ] {
        let job = flat_rate_job(Some(billing), "0", "0");
        let entries = vec![
            verified_entry(job.id, alice.id, hours[0], "2026-02-02"),
            verified_entry(job.id, bob.id, hours[1], "2026-02-03"),
            verified_entry(job.id, carol.id, hours[2], "2026-02-04"),
        ];
        let breakdown =
            compute_job_pay(&job, &entries, &techs, &[], &PayConfig::default()).unwrap();
        priced.push((job, breakdown));
    }

    let report = build_payroll_report(
        date("2026-02-01"),
        date("2026-02-28"),
        &priced,
        Vec::new(),
        None,
    );

    let mut total_pay = BigDecimal::zero();
    let mut total_hours = BigDecimal::zero();
    let mut total_profit = BigDecimal::zero();
    for technician in &report.technicians {
        total_pay += &technician.totals.total_pay;
        total_hours += &technician.totals.total_hours;
        total_profit += &technician.totals.total_profit_share;

        // Each technician's subtotal is the exact sum of their job rows.
        let mut row_sum = BigDecimal::zero();
        for line in &technician.jobs {
            row_sum += &line.total_pay;
        }
        assert_eq!(technician.totals.total_pay, row_sum);
    }

    assert_eq!(report.grand_totals.total_pay, total_pay);
    assert_eq!(report.grand_totals.total_hours, total_hours);
    assert_eq!(report.grand_totals.total_profit_share, total_profit);
}

#[test]
fn repeated_runs_are_identical() {
    let job = flat_rate_job(Some("777.77"), "33.33", "11.11");
    let alice = tech("Alice", "25");
    let bob = tech("Bob", "40");
    let mut entry_a = verified_entry(job.id, alice.id, "6.2", "2026-01-08");
    entry_a.mileage = dec("52.6");
    entry_a.per_diem = dec("35");
    let entry_b = verified_entry(job.id, bob.id, "3.8", "2026-01-09");

    let rates = vec![MileageRate {
        id: Uuid::new_v4(),
        rate_per_mile: dec("0.67"),
        effective_date: date("2026-01-01"),
        end_date: None,
        description: None,
        created_at: Utc::now(),
    }];

    let entries = vec![entry_a, entry_b];
    let techs = vec![alice, bob];
    let config = PayConfig::default();

    let first = compute_job_pay(&job, &entries, &techs, &rates, &config).unwrap();
    let second = compute_job_pay(&job, &entries, &techs, &rates, &config).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
