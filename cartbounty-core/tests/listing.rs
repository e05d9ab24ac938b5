use cartbounty_core::{
    delete_carts, list_carts, Cart, CartFilter, CartQuery, CartType, ListConfig, Memory, Order,
    SortColumn,
};
use chrono::{NaiveDate, NaiveDateTime};

fn time(hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(hour, 0, 0))
}

fn cart(id: i64, email: &str, total: f64, cart_type: CartType) -> Cart {
    Cart {
        id,
        name: Some(format!("Name {id:02}")),
        email: Some(email.to_owned()),
        phone: Some(String::new()),
        cart_contents: Some(r#"[{"product_id":1,"product_title":"Mug","quantity":1}]"#.to_owned()),
        cart_total: Some(total),
        currency: Some("EUR".to_owned()),
        time: time(id as u32),
        cart_type,
        ..Default::default()
    }
}

fn seed() -> Memory {
    let memory = Memory::new();

    for id in 1..=12 {
        let cart_type = if id % 4 == 0 {
            CartType::Recovered
        } else {
            CartType::Abandoned
        };
        let email = if id % 3 == 0 { "" } else { "anna@example.com" };

        memory.insert_cart(cart(id, email, 100.0 - id as f64, cart_type));
    }

    memory.insert_cart(cart(13, "anna@example.com", 1.0, CartType::Excluded));
    memory.insert_cart(Cart {
        cart_contents: Some(String::new()),
        ..cart(14, "anna@example.com", 1.0, CartType::Abandoned)
    });

    memory
}

fn ids(carts: &[Cart]) -> Vec<i64> {
    carts.iter().map(|cart| cart.id).collect()
}

#[tokio::test]
async fn list_default_page() -> anyhow::Result<()> {
    let memory = seed();

    let page = list_carts(&memory, &CartQuery::default()).await?;

    assert_eq!(page.total_items, 12);
    assert_eq!(page.per_page, 10);
    assert_eq!(page.total_pages, 2);
    assert_eq!(ids(&page.items), vec![12, 11, 10, 9, 8, 7, 6, 5, 4, 3]);

    let query = CartQuery::from_request(&ListConfig::default(), None, None, None, Some(2), None);
    let page = list_carts(&memory, &query).await?;

    assert_eq!(ids(&page.items), vec![2, 1]);

    Ok(())
}

#[tokio::test]
async fn list_filters() -> anyhow::Result<()> {
    let memory = seed();

    let query = CartQuery {
        filter: CartFilter::Recovered,
        ..Default::default()
    };
    let page = list_carts(&memory, &query).await?;

    assert_eq!(page.total_items, 3);
    assert_eq!(ids(&page.items), vec![12, 8, 4]);

    let query = CartQuery {
        filter: CartFilter::Recoverable,
        sort: SortColumn::Id,
        order: Order::Asc,
        ..Default::default()
    };
    let page = list_carts(&memory, &query).await?;

    assert_eq!(ids(&page.items), vec![1, 2, 5, 7, 10, 11]);

    Ok(())
}

#[tokio::test]
async fn list_sorted_by_total() -> anyhow::Result<()> {
    let memory = seed();

    let query = CartQuery::from_request(
        &ListConfig::default(),
        Some("all"),
        Some("cart_total"),
        Some("asc"),
        Some(1),
        Some(3),
    );
    let page = list_carts(&memory, &query).await?;

    assert_eq!(page.total_pages, 4);
    assert_eq!(ids(&page.items), vec![12, 11, 10]);

    Ok(())
}

#[tokio::test]
async fn delete_by_ids() -> anyhow::Result<()> {
    let memory = seed();

    assert_eq!(delete_carts(&memory, &[]).await?, 0);
    assert_eq!(delete_carts(&memory, &[1, 2, 99]).await?, 2);
    assert_eq!(delete_carts(&memory, &[3]).await?, 1);

    let page = list_carts(&memory, &CartQuery::default()).await?;
    assert_eq!(page.total_items, 9);

    Ok(())
}
