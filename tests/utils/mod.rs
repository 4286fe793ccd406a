use fieldmap::{MapRegistry, MapRegistryBuilder, Projection, Shape, mappings};

/// Initialise logging once for the test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builder with logging initialised
#[must_use]
pub fn builder() -> MapRegistryBuilder {
    init_logging();
    MapRegistry::builder()
}

#[derive(Debug, Clone, Default, PartialEq, Shape)]
pub struct User {
    pub name: String,
    pub email: String,
    pub age: u32,
}

impl User {
    #[must_use]
    pub fn new(name: &str, email: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            age,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Shape)]
pub struct UserModel {
    pub name: String,
    pub email: String,
    pub age: u32,
    #[shape(readonly)]
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Shape)]
pub struct Order {
    pub customer: User,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Shape)]
pub struct OrderSummary {
    pub customer: UserModel,
    pub total: f64,
}

/// Maps every field
#[derive(Default, Shape)]
pub struct UserMaps;

#[mappings]
impl UserMaps {
    pub fn map(&self, from: &User, to: &mut UserModel) {
        to.name = from.name.clone();
        to.email = from.email.clone();
        to.age = from.age;
    }
}

/// Forgets `email` and `age`
#[derive(Default, Shape)]
pub struct PartialMaps;

#[mappings]
impl PartialMaps {
    pub fn map(&self, from: &User, to: &mut UserModel) {
        to.name = from.name.clone();
    }
}

/// Splits the work over a private helper
#[derive(Default, Shape)]
pub struct SplitMaps;

#[mappings]
impl SplitMaps {
    pub fn map(&self, from: &User, to: &mut UserModel) {
        to.name = from.name.clone();
        self.contact(from, to);
    }

    #[map_ignore(age)]
    fn contact(&self, from: &User, to: &mut UserModel) {
        to.email = from.email.clone();
    }
}

/// Factory mappers that dispatch nested values through the registry
#[derive(Default, Shape)]
pub struct OrderMaps;

#[mappings]
impl OrderMaps {
    pub fn summary(map: &MapRegistry, from: &Order) -> OrderSummary {
        OrderSummary {
            customer: map.from(&from.customer).to().unwrap_or_default(),
            total: from.total,
        }
    }

    pub fn user_model(from: &User) -> UserModel {
        let mut model = UserModel::default();
        model.name = from.name.to_uppercase();
        model.email = from.email.clone();
        model.age = from.age;
        model
    }
}

/// Checks that the source is fully read
#[derive(Default, Shape)]
pub struct AuditMaps;

#[mappings(validate_source)]
impl AuditMaps {
    pub fn map(&self, from: &UserModel, to: &mut User) {
        to.name = from.name.clone();
        to.email = from.email.clone();
    }
}

/// Needs state that only a factory override can provide
#[derive(Shape)]
#[shape(no_default)]
pub struct PrefixMaps {
    pub prefix: String,
}

#[mappings]
impl PrefixMaps {
    #[map_ignore(email, age)]
    pub fn map(&self, from: &User, to: &mut UserModel) {
        to.name = format!("{}{}", self.prefix, from.name);
    }
}

/// Query projections
#[derive(Default, Shape)]
pub struct QueryMaps;

#[mappings]
impl QueryMaps {
    pub fn names() -> Projection<User, UserModel> {
        Projection::new("names", |user: &User| UserModel {
            name: user.name.clone(),
            ..UserModel::default()
        })
    }
}

/// Displayed under a different name than its identifier
#[derive(Debug, Clone, Default, PartialEq, Shape)]
#[shape(name = "Contact")]
pub struct ContactCard {
    pub name: String,
    pub email: String,
}

/// Builds the renamed shape through a struct literal and a typed local
#[derive(Default, Shape)]
pub struct ContactMaps;

#[mappings]
impl ContactMaps {
    pub fn card(from: &User) -> ContactCard {
        ContactCard {
            name: from.name.clone(),
            email: from.email.clone(),
        }
    }

    pub fn model_card(from: &UserModel) -> ContactCard {
        let mut card = ContactCard::default();
        card.name = from.name.clone();
        card.email = from.email.clone();
        card
    }
}

/// Two mappers of the same pair calling each other
#[derive(Default, Shape)]
pub struct CycleMaps;

#[mappings]
impl CycleMaps {
    pub fn map(&self, from: &User, to: &mut UserModel) {
        to.name = from.name.clone();
        self.rest(from, to);
    }

    fn rest(&self, from: &User, to: &mut UserModel) {
        to.email = from.email.clone();
        to.age = from.age;
        if to.name != from.name {
            self.map(from, to);
        }
    }
}

/// A few users
#[must_use]
pub fn users() -> Vec<User> {
    vec![
        User::new("ada", "ada@example.org", 36),
        User::new("grace", "grace@example.org", 45),
        User::new("linus", "linus@example.org", 28),
    ]
}
