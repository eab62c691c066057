use crate::commands::{
    prepare, CommandResult, StepError, EXIT_DATABASE, EXIT_MIGRATION, EXIT_VERIFICATION,
};
use demogenie_db::{connect_with_config, migrations, DemoSeedDataset, SeedResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DATABASE))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_MIGRATION))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), EXIT_VERIFICATION))?;

        let run_result: Result<SeedResult, StepError> = if verification.all_present {
            Ok(seed_result)
        } else {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_message(&failed_checks), EXIT_VERIFICATION))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary(seeded: &SeedResult) -> String {
    if seeded.skipped {
        return "roster already present; demo seed skipped".to_string();
    }

    let bookings = seeded
        .bookings_seeded
        .iter()
        .map(|merchant| format!("  - {merchant}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "demo dataset loaded: {} account executives, {} bookings\n{bookings}",
        seeded.aes_seeded,
        seeded.bookings_seeded.len()
    )
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use demogenie_db::SeedResult;

    use super::{summary, verification_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_message(&["Mike Chen", "Quick Bites Cafe"]),
            "Seed verification failed for checks: Mike Chen, Quick Bites Cafe"
        );
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }

    #[test]
    fn summary_lists_seeded_bookings_or_reports_skip() {
        let loaded = SeedResult {
            skipped: false,
            aes_seeded: 3,
            bookings_seeded: vec!["Bella Vista Restaurant", "Quick Bites Cafe"],
        };
        assert_eq!(
            summary(&loaded),
            "demo dataset loaded: 3 account executives, 2 bookings\n  - Bella Vista Restaurant\n  - Quick Bites Cafe"
        );

        let skipped = SeedResult { skipped: true, aes_seeded: 0, bookings_seeded: Vec::new() };
        assert_eq!(summary(&skipped), "roster already present; demo seed skipped");
    }
}
