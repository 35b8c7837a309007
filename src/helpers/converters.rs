//! Mapping of stored records to response bodies.

use common::{
    DashboardDto, ProfileDto, ReferralDto, SessionDto, TaskCompletionDto, TaskDto, WithdrawalDto,
};
use ledger::{referral::ReferralEntry, task::TaskCompletion};
use model::entities::{profile, task, withdrawal};

use crate::config::Settings;
use crate::session::ActiveSession;

/// Shareable signup link, e.g. `http://localhost:3000/ref/K7Q2M9XA`.
pub fn referral_link(base_url: &str, code: &str) -> String {
    format!("{}/ref/{}", base_url.trim_end_matches('/'), code)
}

pub fn profile_to_dto(model: profile::Model, base_url: &str) -> ProfileDto {
    ProfileDto {
        referral_link: referral_link(base_url, &model.referral_code),
        id: model.id,
        username: model.username,
        email: model.email,
        referral_code: model.referral_code,
        referred_by: model.referred_by,
        total_balance: model.total_balance,
        total_earned: model.total_earned,
        referral_count: model.referral_count,
        created_at: model.created_at,
    }
}

pub fn session_to_dto(session: ActiveSession) -> SessionDto {
    SessionDto {
        token: session.token,
        user_id: session.account_id,
        email: session.email,
        expires_at: session.expires_at,
    }
}

pub fn referral_to_dto(entry: ReferralEntry) -> ReferralDto {
    ReferralDto {
        id: entry.referral.id,
        referred_id: entry.referral.referred_id,
        referred_username: entry.referred_username,
        bonus: entry.referral.bonus,
        created_at: entry.referral.created_at,
    }
}

pub fn task_to_dto(model: task::Model, completed: bool) -> TaskDto {
    TaskDto {
        id: model.id,
        title: model.title,
        description: model.description,
        reward_amount: model.reward_amount,
        task_type: model.task_type.as_str().to_string(),
        task_url: model.task_url,
        completed,
    }
}

pub fn completion_to_dto(completion: TaskCompletion) -> TaskCompletionDto {
    TaskCompletionDto {
        task_id: completion.task.id,
        earnings: completion.record.earnings,
        total_balance: completion.profile.total_balance,
        total_earned: completion.profile.total_earned,
        completed_at: completion.record.completed_at,
    }
}

pub fn withdrawal_to_dto(model: withdrawal::Model) -> WithdrawalDto {
    WithdrawalDto {
        id: model.id,
        amount: model.amount,
        paypal_email: model.paypal_email,
        status: model.status.as_str().to_string(),
        created_at: model.created_at,
        processed_at: model.processed_at,
    }
}

/// Dashboard figures. Every referral earns prize draw entries; the draw
/// unlocks once the referral count reaches the configured threshold.
pub fn dashboard_to_dto(profile: profile::Model, completed_tasks: u64, settings: &Settings) -> DashboardDto {
    let threshold = settings.prize_draw_threshold;
    DashboardDto {
        referral_link: referral_link(&settings.public_base_url, &profile.referral_code),
        username: profile.username,
        total_balance: profile.total_balance,
        total_earned: profile.total_earned,
        referral_count: profile.referral_count,
        completed_tasks,
        prize_draw_entries: profile.referral_count * settings.entries_per_referral,
        prize_draw_unlocked: profile.referral_count >= threshold,
        referrals_until_unlock: (threshold - profile.referral_count).max(0),
    }
}
