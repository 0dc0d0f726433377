use checkout_engine::{
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seed::{test_checkout_config, test_provider_config},
    },
    IpnApi,
    MaintenanceApi,
    OrderFlowApi,
    PaymentSessionApi,
    SqliteDatabase,
};

pub struct Checkout {
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub sessions: PaymentSessionApi<SqliteDatabase>,
    pub ipn: IpnApi<SqliteDatabase>,
    pub maintenance: MaintenanceApi<SqliteDatabase>,
}

pub async fn setup() -> Checkout {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> Checkout {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    Checkout {
        orders: OrderFlowApi::new(db.clone(), test_checkout_config()),
        sessions: PaymentSessionApi::new(db.clone(), test_provider_config()),
        ipn: IpnApi::new(db.clone(), test_provider_config(), producers.clone()),
        maintenance: MaintenanceApi::new(db.clone(), producers).with_batch_size(2),
        db,
    }
}
