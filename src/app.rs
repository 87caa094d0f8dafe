use crate::compare::{self, ComparisonResult};
use crate::config::Config;
use crate::error::{CompareError, LocationError};
use crate::links::{LinkOpener, SystemOpener};
use crate::models::{platform, DetectedLocation, PlatformId, Product, PLATFORMS};
use crate::store::{CartStore, CompareList, InMemoryCart, InMemoryCompareList};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, error, info, warn};

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum ViewMode {
    #[default]
    Catalog,
    Compare,
    Results,
    Settings,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Catalog,
        ViewMode::Compare,
        ViewMode::Results,
        ViewMode::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::Catalog => "Catalog",
            ViewMode::Compare => "Compare",
            ViewMode::Results => "Results",
            ViewMode::Settings => "Settings",
        }
    }

    /// Parses `ui.default_view`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.title().eq_ignore_ascii_case(name))
    }
}

/// Work the main loop has to start on the app's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    DetectLocation {
        request_id: u64,
    },
    Compare {
        request_id: u64,
        products: Vec<Product>,
        location: DetectedLocation,
    },
}

/// Blocking message shown until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

pub struct App {
    pub config: Config,
    pub view_mode: ViewMode,
    pub catalog: Vec<Product>,
    pub catalog_index: usize,
    pub basket_index: usize,
    pub platform_index: usize,
    pub tick_count: usize,
    pub should_quit: bool,

    pub detected_location: Option<DetectedLocation>,
    pub is_detecting: bool,
    pub comparison: Option<ComparisonResult>,
    pub is_comparing: bool,
    pub last_compared: Option<DateTime<Local>>,

    pub notification: Option<Notification>,
    pub status_message: Option<String>,

    compare_list: Box<dyn CompareList>,
    cart: Box<dyn CartStore>,
    links: Box<dyn LinkOpener>,
    location_request: u64,
    compare_request: u64,
}

impl App {
    pub fn new(config: Config, catalog: Vec<Product>) -> Self {
        Self::with_ports(
            config,
            catalog,
            Box::new(InMemoryCompareList::default()),
            Box::new(InMemoryCart::default()),
            Box::new(SystemOpener),
        )
    }

    pub fn with_ports(
        config: Config,
        catalog: Vec<Product>,
        compare_list: Box<dyn CompareList>,
        cart: Box<dyn CartStore>,
        links: Box<dyn LinkOpener>,
    ) -> Self {
        let view_mode = ViewMode::from_name(&config.ui.default_view).unwrap_or_else(|| {
            warn!("Unknown default view '{}'", config.ui.default_view);
            ViewMode::default()
        });

        Self {
            config,
            view_mode,
            catalog,
            catalog_index: 0,
            basket_index: 0,
            platform_index: 0,
            tick_count: 0,
            should_quit: false,
            detected_location: None,
            is_detecting: false,
            comparison: None,
            is_comparing: false,
            last_compared: None,
            notification: None,
            status_message: None,
            compare_list,
            cart,
            links,
            location_request: 0,
            compare_request: 0,
        }
    }

    pub fn basket(&self) -> &[Product] {
        self.compare_list.products()
    }

    pub fn cart(&self) -> &dyn CartStore {
        self.cart.as_ref()
    }

    pub fn is_in_basket(&self, product: &Product) -> bool {
        let id = product.product_id();
        self.basket().iter().any(|p| p.product_id() == id)
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    fn notify(&mut self, title: &str, message: impl Into<String>) {
        self.notification = Some(Notification {
            title: title.to_string(),
            message: message.into(),
        });
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        // Any key dismisses a notification.
        if self.notification.take().is_some() {
            return None;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.view_mode = ViewMode::Catalog,
            KeyCode::Char('2') => self.view_mode = ViewMode::Compare,
            KeyCode::Char('3') => self.view_mode = ViewMode::Results,
            KeyCode::Char('4') => self.view_mode = ViewMode::Settings,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Right if self.view_mode == ViewMode::Results => self.move_selection(1),
            KeyCode::Left if self.view_mode == ViewMode::Results => self.move_selection(-1),
            KeyCode::Enter | KeyCode::Char('a') if self.view_mode == ViewMode::Catalog => {
                self.add_selected_to_compare()
            }
            KeyCode::Char('d') | KeyCode::Delete if self.view_mode == ViewMode::Compare => {
                self.remove_selected_from_compare()
            }
            KeyCode::Char('c') if self.view_mode == ViewMode::Compare => self.clear_compare(),
            KeyCode::Char('o') if self.view_mode == ViewMode::Results => {
                self.open_selected_platform()
            }
            KeyCode::Char('t') => self.add_basket_to_cart(),
            KeyCode::Char('l') => return self.request_location_detection(),
            KeyCode::Char('r') => return self.request_comparison(),
            _ => {}
        }
        None
    }

    fn move_selection(&mut self, delta: isize) {
        let (index, len) = match self.view_mode {
            ViewMode::Catalog => (&mut self.catalog_index, self.catalog.len()),
            ViewMode::Compare => (&mut self.basket_index, self.compare_list.products().len()),
            ViewMode::Results => (&mut self.platform_index, PLATFORMS.len()),
            ViewMode::Settings => return,
        };
        if len == 0 {
            return;
        }
        *index = (*index as isize + delta).rem_euclid(len as isize) as usize;
    }

    pub fn add_selected_to_compare(&mut self) {
        let Some(product) = self.catalog.get(self.catalog_index).cloned() else {
            return;
        };
        let name = product.name.clone();
        if self.compare_list.add_to_compare(product) {
            self.basket_changed();
            self.status_message = Some(format!("Added {name} to compare"));
        } else {
            self.status_message = Some(format!("{name} is already in the basket"));
        }
    }

    pub fn remove_selected_from_compare(&mut self) {
        let Some(id) = self
            .compare_list
            .products()
            .get(self.basket_index)
            .map(Product::product_id)
        else {
            return;
        };
        if self.compare_list.remove_from_compare(&id) {
            let len = self.compare_list.products().len();
            self.basket_index = self.basket_index.min(len.saturating_sub(1));
            self.basket_changed();
        }
    }

    pub fn clear_compare(&mut self) {
        self.compare_list.clear_compare();
        self.basket_index = 0;
        self.basket_changed();
    }

    // Results describe a specific basket; drop them once it changes.
    fn basket_changed(&mut self) {
        if self.comparison.take().is_some() {
            debug!("Basket changed, discarding comparison");
        }
        if self.is_comparing {
            // Invalidate the in-flight comparison too.
            self.compare_request += 1;
            self.is_comparing = false;
        }
    }

    pub fn request_location_detection(&mut self) -> Option<Action> {
        if self.is_detecting {
            return None;
        }
        self.is_detecting = true;
        self.location_request += 1;
        info!(request_id = self.location_request, "Detecting location");
        Some(Action::DetectLocation {
            request_id: self.location_request,
        })
    }

    pub fn on_location_resolved(
        &mut self,
        request_id: u64,
        result: Result<DetectedLocation, LocationError>,
    ) {
        if request_id != self.location_request {
            debug!(request_id, "Dropping stale location result");
            return;
        }
        self.is_detecting = false;
        match result {
            Ok(location) => self.detected_location = Some(location),
            Err(e) => {
                error!("Location detection failed: {}", e);
                self.notify("Location", e.to_string());
            }
        }
    }

    pub fn request_comparison(&mut self) -> Option<Action> {
        if self.is_comparing {
            return None;
        }
        let location = match compare::check_preconditions(
            self.compare_list.products(),
            self.detected_location.as_ref(),
        ) {
            Ok(location) => location.clone(),
            Err(e) => {
                warn!("Comparison refused: {}", e);
                self.notify("Compare", e.to_string());
                return None;
            }
        };

        self.is_comparing = true;
        self.compare_request += 1;
        info!(
            request_id = self.compare_request,
            products = self.compare_list.products().len(),
            "Comparing basket"
        );
        Some(Action::Compare {
            request_id: self.compare_request,
            products: self.compare_list.products().to_vec(),
            location,
        })
    }

    pub fn on_comparison_ready(
        &mut self,
        request_id: u64,
        result: Result<ComparisonResult, CompareError>,
    ) {
        if request_id != self.compare_request {
            debug!(request_id, "Dropping stale comparison result");
            return;
        }
        self.is_comparing = false;
        match result {
            Ok(result) => {
                self.platform_index = result
                    .cheapest_platform
                    .and_then(|id| PLATFORMS.iter().position(|p| p.id == id))
                    .unwrap_or(0);
                match result.cheapest_platform {
                    Some(id) => info!(cheapest = %id, "Comparison complete"),
                    None => info!("Comparison complete, no platform has the full basket"),
                }
                self.comparison = Some(result);
                self.last_compared = Some(Local::now());
                self.view_mode = ViewMode::Results;
            }
            Err(e) => {
                error!("Comparison failed: {}", e);
                self.notify("Compare", e.to_string());
            }
        }
    }

    pub fn selected_platform(&self) -> Option<PlatformId> {
        PLATFORMS.get(self.platform_index).map(|p| p.id)
    }

    pub fn open_selected_platform(&mut self) {
        let Some(id) = self.selected_platform() else {
            return;
        };
        let fully_available = self
            .comparison
            .as_ref()
            .and_then(|c| c.total_for(id))
            .is_some_and(|t| t.is_fully_available());
        let name = platform(id).name;
        if !fully_available {
            self.status_message = Some(format!("{name} cannot deliver the whole basket"));
            return;
        }
        if let Err(e) = self.links.open(id.search_url()) {
            error!("Failed to open {}: {}", id.search_url(), e);
            self.notify("Open", format!("Could not open {name}: {e}"));
        }
    }

    pub fn add_basket_to_cart(&mut self) {
        if self.compare_list.products().is_empty() {
            let e = CompareError::InvalidPreconditions("No products to add to cart");
            warn!("Cart handoff refused: {}", e);
            self.notify("Cart", e.to_string());
            return;
        }
        if self.comparison.is_none() {
            let e = CompareError::InvalidPreconditions("Compare prices before adding to cart");
            warn!("Cart handoff refused: {}", e);
            self.notify("Cart", e.to_string());
            return;
        }
        // The compare list stays as-is so the user can keep comparing.
        self.cart.set_cart_from_compare(self.compare_list.products());
        let count = self.cart.items().len();
        info!(items = count, "Basket handed to cart");
        self.status_message = Some(format!("Added {count} products to cart"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crossterm::event::KeyModifiers;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingOpener(Rc<RefCell<Vec<String>>>);

    impl LinkOpener for RecordingOpener {
        fn open(&self, url: &str) -> io::Result<()> {
            self.0.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn test_app() -> (App, RecordingOpener) {
        let opener = RecordingOpener::default();
        let app = App::with_ports(
            Config::default(),
            catalog::embedded(),
            Box::new(InMemoryCompareList::default()),
            Box::new(InMemoryCart::default()),
            Box::new(opener.clone()),
        );
        (app, opener)
    }

    fn here() -> DetectedLocation {
        DetectedLocation {
            city: "Bengaluru".into(),
            ..Default::default()
        }
    }

    fn run(app: &mut App, action: Option<Action>) {
        match action {
            Some(Action::Compare {
                request_id,
                products,
                location,
            }) => {
                let result = compare::compare_basket(&products, &PLATFORMS, Some(&location));
                app.on_comparison_ready(request_id, result);
            }
            other => panic!("expected a comparison, got {other:?}"),
        }
    }

    #[test]
    fn comparing_without_products_notifies() {
        let (mut app, _) = test_app();
        app.detected_location = Some(here());

        assert_eq!(app.request_comparison(), None);
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some("Please add at least 1 product to compare")
        );
    }

    #[test]
    fn comparing_without_location_notifies() {
        let (mut app, _) = test_app();
        app.add_selected_to_compare();

        assert_eq!(app.request_comparison(), None);
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some("Please detect your location first")
        );
        // Next key only dismisses.
        assert_eq!(app.handle_key(key('q')), None);
        assert!(!app.should_quit);
        assert!(app.notification.is_none());
    }

    #[test]
    fn comparison_switches_to_results() {
        let (mut app, _) = test_app();
        app.add_selected_to_compare();
        app.detected_location = Some(here());

        let action = app.handle_key(key('r'));
        assert!(app.is_comparing);
        run(&mut app, action);

        assert!(!app.is_comparing);
        assert_eq!(app.view_mode, ViewMode::Results);
        let result = app.comparison.as_ref().unwrap();
        assert_eq!(result.location, "Bengaluru");
        assert_eq!(result.products.len(), 1);
        assert!(app.last_compared.is_some());
    }

    #[test]
    fn stale_comparison_is_ignored() {
        let (mut app, _) = test_app();
        app.add_selected_to_compare();
        app.detected_location = Some(here());

        let first = app.request_comparison();
        // Basket changes while the first comparison is pending.
        app.catalog_index = 1;
        app.add_selected_to_compare();
        let second = app.request_comparison();

        run(&mut app, first);
        assert!(app.comparison.is_none());
        assert!(app.is_comparing);

        run(&mut app, second);
        assert_eq!(app.comparison.as_ref().unwrap().products.len(), 2);
    }

    #[test]
    fn stale_location_is_ignored() {
        let (mut app, _) = test_app();
        let Some(Action::DetectLocation { request_id }) = app.request_location_detection() else {
            panic!("expected detection");
        };
        assert_eq!(app.request_location_detection(), None);

        app.on_location_resolved(request_id + 1, Ok(here()));
        assert!(app.detected_location.is_none());

        app.on_location_resolved(request_id, Ok(here()));
        assert_eq!(app.detected_location, Some(here()));
        assert!(!app.is_detecting);
    }

    #[test]
    fn location_failure_notifies_and_allows_retry() {
        let (mut app, _) = test_app();
        let Some(Action::DetectLocation { request_id }) = app.request_location_detection() else {
            panic!("expected detection");
        };
        app.on_location_resolved(request_id, Err(LocationError::UnsupportedCapability));

        assert!(app.notification.is_some());
        assert!(app.detected_location.is_none());
        assert!(app.request_location_detection().is_some());
    }

    #[test]
    fn basket_change_discards_results() {
        let (mut app, _) = test_app();
        app.add_selected_to_compare();
        app.detected_location = Some(here());
        let action = app.request_comparison();
        run(&mut app, action);
        assert!(app.comparison.is_some());

        app.view_mode = ViewMode::Compare;
        app.handle_key(key('d'));

        assert!(app.basket().is_empty());
        assert!(app.comparison.is_none());
    }

    #[test]
    fn open_only_for_fully_available_platform() {
        let (mut app, opener) = test_app();
        // Paneer is out of stock on Zepto.
        app.catalog_index = 2;
        app.add_selected_to_compare();
        app.detected_location = Some(here());
        let action = app.request_comparison();
        run(&mut app, action);

        app.platform_index = 1;
        app.open_selected_platform();
        assert!(opener.0.borrow().is_empty());

        app.platform_index = 0;
        app.open_selected_platform();
        assert_eq!(*opener.0.borrow(), vec!["https://blinkit.com/search".to_string()]);
    }

    #[test]
    fn cart_handoff_keeps_compare_list() {
        let (mut app, _) = test_app();
        app.handle_key(key('t'));
        assert!(app.notification.is_some());
        app.notification = None;

        app.add_selected_to_compare();
        app.detected_location = Some(here());
        let action = app.request_comparison();
        run(&mut app, action);
        app.handle_key(key('t'));

        assert_eq!(app.cart().items().len(), 1);
        assert_eq!(app.basket().len(), 1);
    }

    #[test]
    fn cart_handoff_needs_a_comparison() {
        let (mut app, _) = test_app();
        app.add_selected_to_compare();
        app.handle_key(key('t'));

        assert!(app.cart().items().is_empty());
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some("Compare prices before adding to cart")
        );
    }

    #[test]
    fn selection_wraps() {
        let (mut app, _) = test_app();
        app.view_mode = ViewMode::Results;
        app.handle_key(key('k'));
        assert_eq!(app.platform_index, PLATFORMS.len() - 1);
        app.handle_key(key('j'));
        assert_eq!(app.platform_index, 0);
    }

    #[test]
    fn default_view_is_read_from_config() {
        let mut config = Config::default();
        config.ui.default_view = "compare".into();
        let app = App::new(config, Vec::new());
        assert_eq!(app.view_mode, ViewMode::Compare);
    }
}
