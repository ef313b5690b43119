diesel::table! {
    baskets (id) {
        id -> Int4,
        buyer_id -> Varchar,
    }
}

diesel::table! {
    basket_items (id) {
        id -> Int4,
        basket_id -> Int4,
        catalog_item_id -> Int4,
        unit_price -> Numeric,
        quantity -> Int4,
    }
}

diesel::table! {
    catalog_items (id) {
        id -> Int4,
        name -> Varchar,
        picture_uri -> Varchar,
    }
}

diesel::table! {
    orders (id) {
        id -> Int4,
        buyer_id -> Varchar,
        order_date -> Timestamptz,
        ship_to_street -> Varchar,
        ship_to_city -> Varchar,
        ship_to_state -> Varchar,
        ship_to_country -> Varchar,
        ship_to_zip_code -> Varchar,
    }
}

diesel::table! {
    order_items (id) {
        id -> Int4,
        order_id -> Int4,
        catalog_item_id -> Int4,
        product_name -> Varchar,
        picture_uri -> Varchar,
        unit_price -> Numeric,
        units -> Int4,
    }
}

diesel::joinable!(basket_items -> baskets (basket_id));
diesel::joinable!(order_items -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(
    baskets,
    basket_items,
    catalog_items,
    orders,
    order_items,
);
