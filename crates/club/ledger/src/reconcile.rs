//! Re-deriving a member's balance from their stored contributions.

use crate::{ContributionLedger, LedgerResult};
use club_types::{MemberId, PointsBalance};
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of [`ContributionLedger::reconcile_member`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub member_id: MemberId,
    /// Balance stored before reconciling
    pub previous_points: i64,
    /// Sum of the member's contributions
    pub derived_points: i64,
    /// `derived_points - previous_points`
    pub drift: i64,
    pub balance: PointsBalance,
}

impl Reconciliation {
    pub fn was_consistent(&self) -> bool {
        self.drift == 0
    }
}

impl ContributionLedger {
    /// Bring `member_id`'s points back in line with the sum of their
    /// contributions and refresh the stored level.
    ///
    /// The drift is applied through the atomic increment, but it is computed
    /// from a read taken beforehand, so run this while no other ledger
    /// operation targets the member.
    pub async fn reconcile_member(&self, member_id: &MemberId) -> LedgerResult<Reconciliation> {
        let member = self.load_member(member_id).await?;
        let contributions = self
            .call(
                "list_contributions_for_member",
                self.storage.list_contributions_for_member(member_id),
            )
            .await?;

        let derived_points: i64 = contributions.iter().map(|c| c.points).sum();
        let drift = derived_points - member.points;

        // Applied even when drift is zero so a stale level gets rewritten.
        let balance = self
            .call(
                "increment_member_points",
                self.storage.increment_member_points(
                    member_id,
                    drift,
                    &self.levels,
                    self.clock.now(),
                ),
            )
            .await?;

        if drift == 0 {
            debug!(member = %member_id, points = balance.points, "Points already consistent");
        } else {
            warn!(
                member = %member_id,
                previous = member.points,
                derived = derived_points,
                drift,
                "Reconciled points drift"
            );
        }

        Ok(Reconciliation {
            member_id: member_id.clone(),
            previous_points: member.points,
            derived_points,
            drift,
            balance,
        })
    }
}
