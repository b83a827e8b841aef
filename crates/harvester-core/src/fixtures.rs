use std::sync::Arc;

use lazy_static::lazy_static;

use crate::model::{BusinessId, BusinessRecord, Category};

lazy_static! {
    static ref SAMPLE_STORE: Arc<FixtureStore> = Arc::new(FixtureStore::sample());
}

/// Read-only business records partitioned by category
#[derive(Debug, Clone, Default)]
pub struct FixtureStore {
    restaurants: Vec<BusinessRecord>,
    hotels: Vec<BusinessRecord>,
}

impl FixtureStore {
    pub fn new<I>(records: I) -> Self
    where
        I: IntoIterator<Item = BusinessRecord>,
    {
        let (restaurants, hotels) = records
            .into_iter()
            .partition(|r| r.category == Category::Restaurant);
        Self {
            restaurants,
            hotels,
        }
    }

    /// The process-wide sample data set, built on first access.
    pub fn shared() -> Arc<Self> {
        SAMPLE_STORE.clone()
    }

    pub fn by_category(&self, category: Category) -> &[BusinessRecord] {
        match category {
            Category::Restaurant => &self.restaurants,
            Category::Hotel => &self.hotels,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusinessRecord> {
        self.restaurants.iter().chain(self.hotels.iter())
    }

    pub fn get(&self, id: BusinessId) -> Option<&BusinessRecord> {
        self.iter().find(|r| r.id == id)
    }

    pub fn find_by_url(&self, url: &str) -> Option<&BusinessRecord> {
        let url = url.trim_end_matches('/');
        self.iter()
            .find(|r| r.url.as_deref().map(|u| u.trim_end_matches('/')) == Some(url))
    }

    pub fn len(&self) -> usize {
        self.restaurants.len() + self.hotels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sample() -> Self {
        use Category::{Hotel, Restaurant};

        Self::new([
            fixture(
                "Ristorante Bella Italia",
                Restaurant,
                "Maria Rossi",
                "info@bellaitalia.de",
                "+49 30 12345678",
                "Hauptstraße 123, 10115 Berlin",
                "https://bellaitalia-restaurant.de",
                "10115",
            ),
            fixture(
                "Sushi Palace",
                Restaurant,
                "Takashi Yamamoto",
                "kontakt@sushipalace.de",
                "+49 30 87654321",
                "Friedrichstraße 45, 10117 Berlin",
                "https://sushipalace.de",
                "10117",
            ),
            fixture(
                "Brauhaus am Markt",
                Restaurant,
                "Hans Müller",
                "info@brauhaus-markt.de",
                "+49 30 23456789",
                "Marktplatz 7, 10178 Berlin",
                "https://brauhaus-markt.de",
                "10178",
            ),
            fixture(
                "Curry 36",
                Restaurant,
                "Michael Schmidt",
                "bestellung@curry36.de",
                "+49 30 34567890",
                "Mehringdamm 36, 10961 Berlin",
                "https://curry36.de",
                "10961",
            ),
            fixture(
                "Viet Village",
                Restaurant,
                "Nguyen Van",
                "hello@vietvillage.de",
                "+49 30 45678901",
                "Kantstraße 55, 10625 Berlin",
                "https://vietvillage-restaurant.de",
                "10625",
            ),
            fixture(
                "Pizza Express",
                Restaurant,
                "Luigi Romano",
                "info@pizzaexpress.de",
                "+49 470 1234567",
                "Hauptstraße 42, 47051 Duisburg",
                "https://pizza-express-duisburg.de",
                "47051",
            ),
            fixture(
                "Gasthaus zur Mühle",
                Restaurant,
                "Franz Weber",
                "reservierung@gasthaus-muehle.de",
                "+49 471 7654321",
                "Mühlenweg 8, 47198 Duisburg",
                "https://gasthaus-muehle.de",
                "47198",
            ),
            fixture(
                "Grand Hotel Berlin",
                Hotel,
                "Berlin Hospitality GmbH",
                "reception@grandhotelberlin.de",
                "+49 30 56789012",
                "Unter den Linden 10, 10117 Berlin",
                "https://grandhotel-berlin.de",
                "10117",
            ),
            fixture(
                "City Park Hotel",
                Hotel,
                "Thomas Meyer",
                "info@cityparkhotel.de",
                "+49 30 67890123",
                "Tiergarten Allee 22, 10785 Berlin",
                "https://cityparkhotel.de",
                "10785",
            ),
            fixture(
                "Boutique Hotel Kreuzberg",
                Hotel,
                "Sarah Wagner",
                "stay@boutiquekreuzberg.de",
                "+49 30 78901234",
                "Oranienstraße 83, 10969 Berlin",
                "https://boutique-kreuzberg.de",
                "10969",
            ),
            fixture(
                "Hotel am Hafen",
                Hotel,
                "Peter Fischer",
                "info@hotelamhafen.de",
                "+49 470 9876543",
                "Hafenstraße 15, 47119 Duisburg",
                "https://hotel-am-hafen.de",
                "47119",
            ),
        ])
    }
}

#[allow(clippy::too_many_arguments)]
fn fixture(
    name: &str,
    category: Category,
    owner: &str,
    email: &str,
    phone: &str,
    address: &str,
    url: &str,
    postal_code: &str,
) -> BusinessRecord {
    BusinessRecord {
        owner: Some(owner.to_string()),
        email: Some(email.to_string()),
        phone: Some(phone.to_string()),
        address: Some(address.to_string()),
        ..BusinessRecord::new(name, category)
            .with_url(url)
            .with_postal_code(postal_code)
    }
}
