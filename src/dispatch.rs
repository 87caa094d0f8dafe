use crate::app::Action;
use crate::compare::compare_basket;
use crate::events::Event;
use crate::location::{CoordinateProvider, LocationResolver, ReverseGeocoder};
use crate::models::PLATFORMS;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Runs an app action in the background and posts the result back as an event.
pub fn dispatch<C, G>(
    action: Action,
    resolver: &Arc<LocationResolver<C, G>>,
    compare_delay: Duration,
    tx: &UnboundedSender<Event>,
) where
    C: CoordinateProvider + 'static,
    G: ReverseGeocoder + 'static,
{
    let tx = tx.clone();
    match action {
        Action::DetectLocation { request_id } => {
            let resolver = Arc::clone(resolver);
            tokio::spawn(async move {
                let result = resolver.detect_location().await;
                let _ = tx.send(Event::LocationResolved { request_id, result });
            });
        }
        Action::Compare {
            request_id,
            products,
            location,
        } => {
            tokio::spawn(async move {
                // Pacing only; the comparison itself is synchronous.
                tokio::time::sleep(compare_delay).await;
                let result = compare_basket(&products, &PLATFORMS, Some(&location));
                debug!(request_id, "Comparison computed");
                let _ = tx.send(Event::ComparisonReady { request_id, result });
            });
        }
    }
}
