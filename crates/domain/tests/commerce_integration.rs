//! End-to-end behaviour of the commerce services over the in-memory store.

use std::sync::Arc;

use common::{AddressFields, Money, Product, ProductId, User, UserId};
use document_store::{DocumentStore, InMemoryDocumentStore, UpdateKind};
use domain::{CheckoutStage, Commerce, CommerceError, ErrorKind, MAX_ADDRESSES, input};

struct Shop {
    store: InMemoryDocumentStore,
    commerce: Commerce<InMemoryDocumentStore>,
}

impl Shop {
    fn new() -> Self {
        let store = InMemoryDocumentStore::new();
        Self {
            commerce: Commerce::new(store.clone()),
            store,
        }
    }

    async fn user(&self) -> UserId {
        let user = User::new("Test", "Shopper", "shopper@example.com");
        let id = user.id;
        self.store.insert_user(user).await.unwrap();
        id
    }

    async fn product(&self, name: &str, dollars: i64) -> Product {
        let product = Product::new(name, Money::from_dollars(dollars), format!("{name}.png"));
        self.store.insert_product(product.clone()).await.unwrap();
        product
    }

    async fn add(&self, product: &Product, user_id: UserId) {
        self.commerce
            .cart()
            .add_to_cart(product.id, user_id)
            .await
            .unwrap();
    }

    async fn load(&self, user_id: UserId) -> User {
        self.store.find_user(user_id).await.unwrap().unwrap()
    }
}

fn fields(city: &str) -> AddressFields {
    AddressFields {
        house: "221B".into(),
        street: "Baker Street".into(),
        city: city.into(),
        postal_code: "NW1".into(),
    }
}

mod cart {
    use super::*;

    #[tokio::test]
    async fn total_follows_adds_and_removes() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let a = shop.product("A", 10).await;
        let b = shop.product("B", 20).await;
        let c = shop.product("C", 5).await;
        for product in [&a, &b, &c] {
            shop.add(product, user_id).await;
        }

        let total = shop.commerce.cart().cart_total(user_id).await.unwrap();
        assert_eq!(total.total, Money::from_dollars(35));

        shop.commerce
            .cart()
            .remove_item(b.id, user_id)
            .await
            .unwrap();
        let total = shop.commerce.cart().cart_total(user_id).await.unwrap();
        assert_eq!(total.total, Money::from_dollars(15));
    }

    #[tokio::test]
    async fn remove_drops_every_matching_entry() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let pen = shop.product("Pen", 2).await;
        let pad = shop.product("Pad", 4).await;
        shop.add(&pen, user_id).await;
        shop.add(&pad, user_id).await;
        shop.add(&pen, user_id).await;

        shop.commerce
            .cart()
            .remove_item(pen.id, user_id)
            .await
            .unwrap();

        let cart = shop.commerce.cart().get_cart(user_id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product_id, pad.id);
    }

    #[tokio::test]
    async fn remove_only_touches_the_given_user() {
        let shop = Shop::new();
        let alice = shop.user().await;
        let bob = shop.user().await;
        let pen = shop.product("Pen", 2).await;
        shop.add(&pen, alice).await;
        shop.add(&pen, bob).await;

        shop.commerce.cart().remove_item(pen.id, alice).await.unwrap();

        assert!(shop.load(alice).await.cart.is_empty());
        assert_eq!(shop.load(bob).await.cart.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_survives_catalog_change() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let mut lamp = shop.product("Lamp", 30).await;
        shop.add(&lamp, user_id).await;

        lamp.name = "Deluxe Lamp".into();
        lamp.price = Money::from_dollars(99);
        shop.store.replace_product(lamp).await.unwrap();

        let cart = shop.commerce.cart().get_cart(user_id).await.unwrap();
        assert_eq!(cart[0].name, "Lamp");
        assert_eq!(cart[0].price, Money::from_dollars(30));
    }

    #[tokio::test]
    async fn concurrent_adds_for_one_user_all_land() {
        let shop = Arc::new(Shop::new());
        let user_id = shop.user().await;
        let mug = shop.product("Mug", 3).await;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let shop = shop.clone();
                let product_id = mug.id;
                tokio::spawn(async move {
                    shop.commerce
                        .cart()
                        .add_to_cart(product_id, user_id)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let total = shop.commerce.cart().cart_total(user_id).await.unwrap();
        assert_eq!(total.total, Money::from_dollars(60));
        assert_eq!(shop.load(user_id).await.cart.len(), 20);
    }
}

mod checkout {
    use super::*;

    #[tokio::test]
    async fn bulk_checkout_moves_cart_into_order() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let p1 = shop.product("P1", 10).await;
        let p2 = shop.product("P2", 20).await;
        shop.add(&p1, user_id).await;
        shop.add(&p2, user_id).await;

        let order = shop
            .commerce
            .checkout()
            .buy_from_cart(user_id)
            .await
            .unwrap();

        assert_eq!(order.price, Money::from_dollars(30));
        let ids: Vec<ProductId> = order.items.iter().map(|e| e.product_id).collect();
        assert_eq!(ids, vec![p1.id, p2.id]);

        let user = shop.load(user_id).await;
        assert!(user.cart.is_empty());
        assert_eq!(user.orders.len(), 1);
        assert_eq!(user.orders[0], order);
    }

    #[tokio::test]
    async fn orders_accumulate_and_stay_unchanged() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let p1 = shop.product("P1", 10).await;

        shop.add(&p1, user_id).await;
        let first = shop
            .commerce
            .checkout()
            .buy_from_cart(user_id)
            .await
            .unwrap();
        shop.add(&p1, user_id).await;
        shop.add(&p1, user_id).await;
        let second = shop
            .commerce
            .checkout()
            .buy_from_cart(user_id)
            .await
            .unwrap();

        let user = shop.load(user_id).await;
        assert_eq!(user.orders, vec![first, second]);
        assert_eq!(user.orders[1].price, Money::from_dollars(20));
    }

    #[tokio::test]
    async fn instant_buy_never_touches_cart() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let in_cart = shop.product("Kept", 7).await;
        let bought = shop.product("Bought", 12).await;
        shop.add(&in_cart, user_id).await;
        let cart_before = shop.load(user_id).await.cart;

        let order = shop
            .commerce
            .checkout()
            .instant_buy(bought.id, user_id)
            .await
            .unwrap();

        assert_eq!(order.price, Money::from_dollars(12));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id, bought.id);

        let user = shop.load(user_id).await;
        assert_eq!(user.cart, cart_before);
        assert_eq!(user.orders, vec![order]);
    }

    #[tokio::test]
    async fn failed_final_write_is_reported_without_rollback() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let p1 = shop.product("P1", 10).await;
        shop.add(&p1, user_id).await;
        shop.store.fail_update(UpdateKind::ReplaceCart);

        let err = shop
            .commerce
            .checkout()
            .buy_from_cart(user_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreWriteFailed);
        assert!(matches!(
            err,
            CommerceError::PurchaseFailed {
                stage: CheckoutStage::ClearCart,
                ..
            }
        ));

        let user = shop.load(user_id).await;
        assert_eq!(user.orders.len(), 1);
        assert_eq!(user.orders[0].items.len(), 1);
        assert_eq!(user.cart.len(), 1);
    }
}

mod addresses {
    use super::*;

    #[tokio::test]
    async fn at_most_two_addresses() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let addresses = shop.commerce.addresses();

        addresses.add_address(user_id, fields("Home")).await.unwrap();
        addresses.add_address(user_id, fields("Work")).await.unwrap();
        let before = shop.load(user_id).await.addresses;

        for _ in 0..3 {
            let err = addresses
                .add_address(user_id, fields("Extra"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::LimitExceeded);
        }

        let after = shop.load(user_id).await.addresses;
        assert_eq!(after, before);
        assert_eq!(after.len(), MAX_ADDRESSES);
    }

    #[tokio::test]
    async fn concurrent_adds_respect_the_limit() {
        let shop = Arc::new(Shop::new());
        let user_id = shop.user().await;

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let shop = shop.clone();
                tokio::spawn(async move {
                    shop.commerce
                        .addresses()
                        .add_address(user_id, fields(&format!("City {i}")))
                        .await
                })
            })
            .collect();

        let mut added = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                added += 1;
            }
        }

        assert_eq!(added, MAX_ADDRESSES);
        assert_eq!(shop.load(user_id).await.addresses.len(), MAX_ADDRESSES);
    }

    #[tokio::test]
    async fn delete_clears_both_slots_even_if_one_was_set() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let addresses = shop.commerce.addresses();
        addresses.add_address(user_id, fields("Home")).await.unwrap();

        addresses.delete_addresses(user_id).await.unwrap();

        assert!(shop.load(user_id).await.addresses.is_empty());
        assert_eq!(
            addresses.count_addresses(user_id).await.unwrap().count,
            0
        );
    }

    #[tokio::test]
    async fn edits_target_slot_position() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let addresses = shop.commerce.addresses();
        let home = addresses.add_address(user_id, fields("Home")).await.unwrap();
        addresses.add_address(user_id, fields("Work")).await.unwrap();

        addresses
            .edit_home_address(user_id, fields("Moved"))
            .await
            .unwrap();

        let stored = shop.load(user_id).await.addresses;
        assert_eq!(stored[0].id, home.id);
        assert_eq!(stored[0].fields.city, "Moved");
        assert_eq!(stored[1].fields.city, "Work");
    }
}

mod boundary {
    use super::*;

    #[tokio::test]
    async fn raw_ids_round_trip_through_input_parsing() {
        let shop = Shop::new();
        let user_id = shop.user().await;
        let mug = shop.product("Mug", 3).await;

        let parsed_user = input::user_id(&user_id.to_string()).unwrap();
        let parsed_product = input::product_id(&mug.id.to_string()).unwrap();
        shop.commerce
            .cart()
            .add_to_cart(parsed_product, parsed_user)
            .await
            .unwrap();

        assert_eq!(shop.load(user_id).await.cart.len(), 1);
    }

    #[test]
    fn malformed_ids_are_invalid_input() {
        assert_eq!(
            input::user_id("not-an-id").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            input::product_id("").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
