use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use learnmart_core::{AppError, Paginated, PaginationParams, RepoError};
use learnmart_models::{
    Bid, CreateGigDto, Gig, GigDetail, GigFilterParams, GigStatus, NotificationKind, PlaceBidDto,
    PurchaseType, Transaction, TransactionType,
};
use learnmart_observability::track_bid_placed;

use crate::modules::notifications::NotificationService;
use crate::state::AppState;

const BID_TOO_LOW: &str = "Bid must be higher than the current highest bid";

pub struct GigService;

impl GigService {
    async fn find_gig(state: &AppState, id: Uuid) -> Result<Gig, AppError> {
        state
            .repos
            .gigs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Gig not found"))
    }

    #[instrument(skip(state))]
    pub async fn create_gig(
        state: &AppState,
        admin_id: Uuid,
        dto: CreateGigDto,
    ) -> Result<Gig, AppError> {
        let now = Utc::now();
        if dto.ends_at <= now {
            return Err(AppError::bad_request("endsAt must be in the future"));
        }

        let gig = Gig {
            id: Uuid::new_v4(),
            created_by: admin_id,
            title: dto.title.trim().to_string(),
            description: dto.description.trim().to_string(),
            min_bid: dto.min_bid,
            starts_at: dto.starts_at,
            ends_at: dto.ends_at,
            status: GigStatus::Open,
            winning_bid_id: None,
            created_at: now,
        };
        state.repos.gigs.create(&gig).await?;

        info!(gig_id = %gig.id, "Gig created");
        Ok(gig)
    }

    #[instrument(skip(state))]
    pub async fn list_gigs(
        state: &AppState,
        filters: GigFilterParams,
    ) -> Result<Paginated<Gig>, AppError> {
        let (gigs, total) = state.repos.gigs.list(&filters).await?;
        Ok(Paginated::new(gigs, total, &filters.pagination))
    }

    #[instrument(skip(state))]
    pub async fn get_gig(state: &AppState, id: Uuid) -> Result<GigDetail, AppError> {
        let gig = Self::find_gig(state, id).await?;
        let bid_count = state.repos.gigs.count_bids(gig.id).await?;
        let highest_bid = state
            .repos
            .gigs
            .highest_bid(gig.id)
            .await?
            .map(|bid| bid.amount);

        Ok(GigDetail {
            gig,
            bid_count,
            highest_bid,
        })
    }

    #[instrument(skip(state))]
    pub async fn list_bids(
        state: &AppState,
        gig_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<Paginated<Bid>, AppError> {
        let gig = Self::find_gig(state, gig_id).await?;
        let (bids, total) = state.repos.gigs.list_bids(gig.id, &pagination).await?;
        Ok(Paginated::new(bids, total, &pagination))
    }

    #[instrument(skip(state))]
    pub async fn list_my_bids(
        state: &AppState,
        instructor_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<Paginated<Bid>, AppError> {
        let (bids, total) = state
            .repos
            .gigs
            .list_bids_by_instructor(instructor_id, &pagination)
            .await?;
        Ok(Paginated::new(bids, total, &pagination))
    }

    /// Places a bid inside the gig's window.
    ///
    /// The bid must reach `minBid`, beat the current highest bid and be
    /// covered by the bidder's balance. Coins only move at settlement.
    #[instrument(skip(state, dto), fields(amount = dto.amount))]
    pub async fn place_bid(
        state: &AppState,
        instructor_id: Uuid,
        gig_id: Uuid,
        dto: PlaceBidDto,
    ) -> Result<Bid, AppError> {
        let gig = Self::find_gig(state, gig_id).await?;
        let now = Utc::now();

        if gig.status != GigStatus::Open {
            return Err(AppError::bad_request("Gig is not open for bidding"));
        }
        if !gig.has_started(now) {
            return Err(AppError::bad_request("Gig has not started yet"));
        }
        if gig.has_ended(now) {
            return Err(AppError::bad_request("Gig has expired"));
        }
        if dto.amount < gig.min_bid {
            return Err(AppError::bad_request(format!(
                "Bid must be at least {} coins",
                gig.min_bid
            )));
        }

        if let Some(highest) = state.repos.gigs.highest_bid(gig.id).await?
            && dto.amount <= highest.amount
        {
            return Err(AppError::bad_request(BID_TOO_LOW));
        }

        let bidder = state
            .repos
            .users
            .find_by_id(instructor_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if bidder.coins < dto.amount {
            return Err(AppError::bad_request("Insufficient coin balance"));
        }

        let bid = Bid {
            id: Uuid::new_v4(),
            gig_id: gig.id,
            instructor_id,
            amount: dto.amount,
            message: dto
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            created_at: now,
        };

        // A concurrent higher bid can still land between the check and the insert
        let displaced = state.repos.gigs.place_bid(&bid).await.map_err(|e| match e {
            RepoError::Conflict(_) => AppError::bad_request(BID_TOO_LOW),
            other => other.into(),
        })?;

        track_bid_placed();

        if let Some(previous) = displaced
            && previous.instructor_id != instructor_id
        {
            NotificationService::notify(
                state,
                previous.instructor_id,
                NotificationKind::Bid,
                "You have been outbid",
                format!(
                    "Someone bid {} coins on \"{}\", above your {} coins",
                    bid.amount, gig.title, previous.amount
                ),
            )
            .await;
        }

        info!(gig_id = %gig.id, bid_id = %bid.id, "Bid placed");
        Ok(bid)
    }

    /// Closes a gig and charges the winner.
    ///
    /// The winner is the highest bidder who can still cover their bid; a gig
    /// without such a bid closes with no winner.
    #[instrument(skip(state))]
    pub async fn close_gig(state: &AppState, gig_id: Uuid) -> Result<Gig, AppError> {
        let gig = Self::find_gig(state, gig_id).await?;
        if gig.status != GigStatus::Open {
            return Err(AppError::bad_request("Gig is already closed"));
        }

        let mut winner = None;
        for bid in state.repos.gigs.bids_by_amount(gig.id).await? {
            let can_pay = state
                .repos
                .users
                .find_by_id(bid.instructor_id)
                .await?
                .is_some_and(|user| user.coins >= bid.amount && !user.is_blocked);
            if can_pay {
                winner = Some(bid);
                break;
            }
        }

        let movements: Vec<Transaction> = winner
            .iter()
            .map(|bid| {
                Transaction::new(
                    bid.instructor_id,
                    TransactionType::Debit,
                    PurchaseType::Gig,
                    bid.amount,
                    format!("Winning bid on {}", gig.title),
                )
                .with_reference(gig.id.to_string())
            })
            .collect();

        let closed = state
            .repos
            .gigs
            .settle(gig.id, winner.as_ref().map(|bid| bid.id), &movements)
            .await?;

        if let Some(bid) = &winner {
            NotificationService::notify(
                state,
                bid.instructor_id,
                NotificationKind::Gig,
                "You won a gig",
                format!(
                    "Your bid of {} coins won \"{}\"",
                    bid.amount, gig.title
                ),
            )
            .await;
        }

        info!(
            gig_id = %gig.id,
            winning_bid_id = ?closed.winning_bid_id,
            "Gig closed"
        );
        Ok(closed)
    }
}
