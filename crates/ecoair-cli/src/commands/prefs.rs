//! User preferences.

use anyhow::{Result, bail};
use ecoair_store::{Coordinates, StorageFacade};

use crate::cli::PrefsAction;
use crate::format::{PreferencesView, format_prefs_text, to_json};

use super::OutputOptions;

/// `HH:MM` with hours 00-23 and minutes 00-59.
fn is_valid_reminder_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    hours.len() == 2
        && minutes.len() == 2
        && hours.parse::<u8>().is_ok_and(|h| h < 24)
        && minutes.parse::<u8>().is_ok_and(|m| m < 60)
}

pub async fn cmd_prefs(
    storage: &StorageFacade,
    action: PrefsAction,
    opts: OutputOptions,
) -> Result<()> {
    match action {
        PrefsAction::Show => {
            let view = PreferencesView {
                last_city: storage.last_city().await?,
                onboarding_done: storage.onboarding_done().await?,
                notifications: storage.notifications().await?,
                user_location: storage.user_location().await?,
            };
            if opts.is_json() {
                print!("{}", to_json(&view)?);
            } else {
                print!("{}", format_prefs_text(&view));
            }
        }
        PrefsAction::SetLastCity { city } => {
            storage.set_last_city(&city).await?;
            opts.notice(format!("Last city set to '{}'", city.trim()));
        }
        PrefsAction::OnboardingDone { undo } => {
            storage.set_onboarding_done(!undo).await?;
            opts.notice(if undo {
                "Onboarding marked as pending"
            } else {
                "Onboarding marked as done"
            });
        }
        PrefsAction::Notifications {
            enable,
            disable,
            threshold,
            daily_reminder,
            reminder_time,
        } => {
            let mut settings = storage.notifications().await?;
            if enable {
                settings.enabled = true;
            }
            if disable {
                settings.enabled = false;
            }
            if let Some(threshold) = threshold {
                if threshold < 0 {
                    bail!("Alert threshold must not be negative");
                }
                settings.alert_threshold = threshold;
            }
            if let Some(daily) = daily_reminder {
                settings.daily_reminder = daily;
            }
            if let Some(time) = reminder_time {
                if !is_valid_reminder_time(&time) {
                    bail!("Invalid reminder time '{}'. Use HH:MM", time);
                }
                settings.reminder_time = time;
            }

            storage.set_notifications(&settings).await?;
            opts.notice("Notification settings saved");
        }
        PrefsAction::Location { lat, lon } => {
            let location = Coordinates::new(lat, lon)?;
            storage.set_user_location(&location).await?;
            opts.notice(format!("Location set to {lat}, {lon}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_time_validation() {
        assert!(is_valid_reminder_time("09:00"));
        assert!(is_valid_reminder_time("23:59"));
        assert!(!is_valid_reminder_time("24:00"));
        assert!(!is_valid_reminder_time("9:00"));
        assert!(!is_valid_reminder_time("09-00"));
        assert!(!is_valid_reminder_time("ab:cd"));
    }
}
