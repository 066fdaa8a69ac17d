//! End-to-end flows against the remote backend (in-memory SQLite). The
//! device store still carries the cart and session; entities live in rows.

#![allow(clippy::unwrap_used)]

use lilymart_core::{
    Amount, Banner, BannerId, Credential, Customer, Email, NewProduct, NewUser, OrderId,
    OrderStatus, ProductPatch, Settings, UserPatch,
};
use lilymart_store::local::{LocalKv, MemoryStore};
use lilymart_store::{Store, StoreError, remote};

async fn remote_store() -> Store {
    let pool = remote::connect_in_memory().await.unwrap();
    Store::assemble(LocalKv::new(MemoryStore::new()), Some(pool))
}

fn new_user(email: &str, password: &str) -> NewUser {
    NewUser {
        name: "Bat".to_owned(),
        last_name: None,
        email: Email::parse(email).unwrap(),
        phone: "99110011".to_owned(),
        avatar: None,
        password: Credential::from(password),
        gender: None,
        birth_year: None,
        birth_month: None,
        birth_day: None,
        is_admin: false,
    }
}

fn new_product(name: &str, price: i64) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        price: Amount::new(price),
        image: "img.jpg".to_owned(),
        ..NewProduct::default()
    }
}

fn customer() -> Customer {
    Customer {
        name: "Bat".to_owned(),
        phone: "99110011".to_owned(),
        address: "Peace Avenue 1".to_owned(),
    }
}

async fn login_admin(store: &Store) {
    store.bootstrap().await.unwrap();
    assert!(store.login("admin", "admin123").await.is_some());
}

#[tokio::test]
async fn test_product_crud_roundtrip() {
    let store = remote_store().await;
    login_admin(&store).await;

    let mut new = new_product("Shirt", 1000);
    new.colors = vec!["red".to_owned(), "blue".to_owned()];
    new.compare_at_price = Some(Amount::new(1500));
    let product = store.products.add(new).await.unwrap();

    let fetched = store.products.get_by_id(&product.id).await.unwrap();
    assert_eq!(fetched, product);
    assert_eq!(fetched.colors, vec!["red", "blue"]);

    let updated = store
        .products
        .update(
            &product.id,
            ProductPatch {
                price: Some(Amount::new(900)),
                compare_at_price: Some(None),
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, Amount::new(900));
    assert!(updated.compare_at_price.is_none());
    assert_eq!(updated.name, "Shirt");

    assert!(store.products.delete(&product.id).await.unwrap());
    assert!(!store.products.delete(&product.id).await.unwrap());
    assert!(store.products.get().await.is_empty());
}

#[tokio::test]
async fn test_negative_price_rejected() {
    let store = remote_store().await;
    login_admin(&store).await;
    let err = store.products.add(new_product("X", -5)).await.unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[tokio::test]
async fn test_email_unique_case_insensitively_in_rows() {
    let store = remote_store().await;
    store
        .register(new_user("Bat@Example.com", "pw"))
        .await
        .unwrap();
    store.logout();

    let err = store
        .register(new_user("bat@EXAMPLE.com", "other"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::EmailTaken));
}

#[tokio::test]
async fn test_profile_update_persists() {
    let store = remote_store().await;
    store.register(new_user("bat@example.com", "pw")).await.unwrap();

    let updated = store
        .users
        .update_current(UserPatch {
            name: Some("Bold".to_owned()),
            birth_year: Some(Some(1990)),
            ..UserPatch::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "Bold");

    let current = store.users.current().await.unwrap();
    assert_eq!(current.name, "Bold");
    assert_eq!(current.birth_year, Some(1990));
    assert_eq!(current.email.as_str(), "bat@example.com");
}

#[tokio::test]
async fn test_delete_account_clears_session() {
    let store = remote_store().await;
    store.register(new_user("bat@example.com", "pw")).await.unwrap();

    store.users.delete_current().await.unwrap();
    assert!(!store.session.is_authenticated());
    assert!(store.login("bat@example.com", "pw").await.is_none());
}

#[tokio::test]
async fn test_order_ids_come_from_the_sequence() {
    let store = remote_store().await;
    login_admin(&store).await;
    let product = store.products.add(new_product("Shirt", 1000)).await.unwrap();

    store.cart.add(&product, 1, None, None).await;
    let first = store.orders.checkout(customer()).await.unwrap();
    store.cart.add(&product, 1, None, None).await;
    let second = store.orders.checkout(customer()).await.unwrap();

    assert_eq!(first.id.as_str(), "000001");
    assert_eq!(second.id.as_str(), "000002");

    let orders = store.orders.get().await;
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.status == OrderStatus::Unpaid));
}

#[tokio::test]
async fn test_status_update_is_admin_gated() {
    let store = remote_store().await;
    login_admin(&store).await;
    let product = store.products.add(new_product("Shirt", 1000)).await.unwrap();
    store.cart.add(&product, 1, None, None).await;
    let order = store.orders.checkout(customer()).await.unwrap();

    let updated = store
        .orders
        .update_status(&order.id, OrderStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);
    assert_eq!(
        store.orders.get_by_id(&order.id).await.unwrap().status,
        OrderStatus::Paid
    );

    store.logout();
    assert!(matches!(
        store
            .orders
            .update_status(&order.id, OrderStatus::Delivered)
            .await
            .unwrap_err(),
        StoreError::Forbidden
    ));

    login_admin(&store).await;
    assert!(matches!(
        store
            .orders
            .update_status(&OrderId::from("999999"), OrderStatus::Paid)
            .await
            .unwrap_err(),
        StoreError::NotFound
    ));
}

#[tokio::test]
async fn test_cart_mirror_merges_on_login_from_second_device() {
    let pool = remote::connect_in_memory().await.unwrap();
    let device_a = Store::assemble(LocalKv::new(MemoryStore::new()), Some(pool.clone()));
    login_admin(&device_a).await;
    let product = device_a.products.add(new_product("Shirt", 1000)).await.unwrap();
    device_a.logout();

    device_a.register(new_user("bat@example.com", "pw")).await.unwrap();
    device_a.cart.add(&product, 2, Some("red"), None).await;

    // Second device: an anonymous line for the same variant, then login.
    // The mirror's larger quantity wins over the device's.
    let device_b = Store::assemble(LocalKv::new(MemoryStore::new()), Some(pool));
    device_b.cart.add(&product, 1, Some("red"), None).await;
    device_b.login("bat@example.com", "pw").await.unwrap();

    let lines = device_b.cart.get().await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].qty, 2);
}

#[tokio::test]
async fn test_relogin_leaves_cart_unchanged() {
    let store = remote_store().await;
    login_admin(&store).await;
    let product = store.products.add(new_product("Shirt", 1000)).await.unwrap();
    store.logout();

    store.register(new_user("bat@example.com", "pw")).await.unwrap();
    store.cart.add(&product, 2, Some("red"), None).await;

    // The mirror now equals the device cart; merging on re-login must not
    // double quantities.
    store.logout();
    store.login("bat@example.com", "pw").await.unwrap();
    let lines = store.cart.get().await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].qty, 2);

    store.logout();
    store.login("bat@example.com", "pw").await.unwrap();
    assert_eq!(store.cart.get().await[0].qty, 2);
}

#[tokio::test]
async fn test_settings_singleton_upserts() {
    let store = remote_store().await;
    login_admin(&store).await;

    store
        .settings
        .set(Settings {
            shipping_fee: Amount::new(3000),
            ..Settings::default()
        })
        .await
        .unwrap();
    store
        .settings
        .set(Settings {
            shipping_fee: Amount::new(5000),
            product_details_text: "100% cotton".to_owned(),
            ..Settings::default()
        })
        .await
        .unwrap();

    let settings = store.settings.get().await;
    assert_eq!(settings.shipping_fee, Amount::new(5000));
    assert_eq!(settings.product_details_text, "100% cotton");

    assert!(matches!(
        store
            .settings
            .set(Settings {
                shipping_fee: Amount::new(-1),
                ..Settings::default()
            })
            .await
            .unwrap_err(),
        StoreError::Invalid(_)
    ));
}

#[tokio::test]
async fn test_category_conflict_and_cascade_in_rows() {
    let store = remote_store().await;
    login_admin(&store).await;

    store.categories.add("Shoes").await.unwrap();
    assert!(matches!(
        store.categories.add("Shoes").await.unwrap_err(),
        StoreError::Conflict(_)
    ));

    let mut new = new_product("Boot", 2000);
    new.category = "Shoes".to_owned();
    let product = store.products.add(new).await.unwrap();

    store.categories.rename("Shoes", "Footwear").await.unwrap();
    assert_eq!(
        store.products.get_by_id(&product.id).await.unwrap().category,
        "Footwear"
    );

    assert!(store.categories.delete("Footwear").await.unwrap());
    assert_eq!(store.products.get_by_id(&product.id).await.unwrap().category, "");
}

#[tokio::test]
async fn test_banner_set_diffs_and_reranks() {
    let store = remote_store().await;
    login_admin(&store).await;

    let banner = |id: &str, image: &str| Banner {
        id: BannerId::from(id),
        image: image.to_owned(),
        title: None,
        subtitle: None,
        link: None,
        order: 0,
    };

    store
        .banners
        .set(vec![banner("b1", "one.jpg"), banner("b2", "two.jpg"), banner("b3", "three.jpg")])
        .await
        .unwrap();

    // Reorder, drop b2, and add a fresh item with a minted id.
    let saved = store
        .banners
        .set(vec![banner("b3", "three.jpg"), banner("", "four.jpg"), banner("b1", "one-v2.jpg")])
        .await
        .unwrap();
    assert!(!saved[1].id.as_str().is_empty());

    let banners = store.banners.get().await;
    assert_eq!(banners.len(), 3);
    assert_eq!(banners[0].id.as_str(), "b3");
    assert_eq!(banners[0].order, 0);
    assert_eq!(banners[1].image, "four.jpg");
    assert_eq!(banners[2].image, "one-v2.jpg");
    assert!(!banners.iter().any(|b| b.id.as_str() == "b2"));
}
