//! Rental creation workflow.
//!
//! Checks that the customer and movie exist and that the movie is in stock,
//! then stores the rental and takes one copy out of stock in a single atomic
//! store operation. The stock check here only gives early feedback; the store's
//! conditional decrement is what prevents overselling when requests race.

use tracing::{debug, info};
use uuid::Uuid;
use vidly_common::{Customer, Error, Movie, Rental, Result};

use crate::storage::{Repository, RentalCommit};

/// Rent `movie_id` to `customer_id`
pub async fn create_rental(repo: &Repository, customer_id: Uuid, movie_id: Uuid) -> Result<Rental> {
    let customer = repo
        .find::<Customer>(customer_id)
        .await
        .map_err(Error::Storage)?
        .ok_or(Error::InvalidCustomer)?;

    let movie = repo
        .find::<Movie>(movie_id)
        .await
        .map_err(Error::Storage)?
        .ok_or(Error::InvalidMovie)?;

    if !movie.in_stock() {
        return Err(Error::OutOfStock);
    }

    let rental = Rental::new(&customer, &movie);

    match repo.commit_rental(&rental).await {
        Ok(RentalCommit::Committed) => {
            info!(
                "Rental {} created: movie {} to customer {}",
                rental.id, movie.id, customer.id
            );
            Ok(rental)
        }
        Ok(RentalCommit::OutOfStock) => {
            debug!("Movie {} sold out before rental {} committed", movie.id, rental.id);
            Err(Error::OutOfStock)
        }
        Ok(RentalCommit::MovieMissing) => Err(Error::InvalidMovie),
        Err(e) => Err(Error::TransactionFailed(e)),
    }
}
