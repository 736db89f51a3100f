use serde_json::json;

use super::*;

const ORIGIN: &str = "https://www.autotrader.ca";

fn normalize(record: &Value) -> Listing {
    normalize_listing(record, RecordShape::detect(record), ORIGIN).unwrap()
}

// -----------------------------------------------------------------------
// RecordShape::detect
// -----------------------------------------------------------------------

#[test]
fn detect_flat_when_no_sub_objects() {
    let record = json!({"title": "2019 Ford F150", "price": "$30,000", "location": "London"});
    assert_eq!(RecordShape::detect(&record), RecordShape::Flat);
}

#[test]
fn detect_nested_from_vehicle_key() {
    let record = json!({"vehicle": {"make": "Honda"}, "price": {"amount": 1}});
    assert_eq!(RecordShape::detect(&record), RecordShape::Nested);
}

#[test]
fn detect_nested_formatted_from_price_text() {
    let record = json!({"vehicle": {}, "price": {"formatted": "$1"}});
    assert_eq!(RecordShape::detect(&record), RecordShape::NestedFormatted);
}

#[test]
fn detect_nested_from_location_object_alone() {
    let record = json!({"location": {"city": "London"}});
    assert_eq!(RecordShape::detect(&record), RecordShape::Nested);
}

// -----------------------------------------------------------------------
// shape equivalence
// -----------------------------------------------------------------------

#[test]
fn all_three_shapes_produce_the_same_listing() {
    let flat = json!({
        "make": "Honda",
        "model": "Civic",
        "modelYear": 2020,
        "price": "$24,500",
        "location": "London",
        "mileageInKm": 41000,
        "url": "/a/honda/civic/london/ontario/5_1",
        "images": ["https://img.autotrader.ca/1.jpg", "https://img.autotrader.ca/2.jpg"]
    });
    let nested = json!({
        "vehicle": {"make": "Honda", "model": "Civic", "modelYear": 2020, "mileageInKm": 41000},
        "price": {"amount": 24500},
        "location": {"city": "London"},
        "url": "/a/honda/civic/london/ontario/5_1",
        "images": [{"url": "https://img.autotrader.ca/1.jpg"}]
    });
    let nested_formatted = json!({
        "vehicle": {"make": "Honda", "model": "Civic", "year": "2020", "mileage": "41,000 km"},
        "price": {"formatted": "$24,500"},
        "location": {"city": "London", "province": "ON"},
        "detailUrl": "https://www.autotrader.ca/a/honda/civic/london/ontario/5_1",
        "vehicle_extra": null,
        "photos": [{"src": "https://img.autotrader.ca/1.jpg"}]
    });

    assert_eq!(RecordShape::detect(&flat), RecordShape::Flat);
    assert_eq!(RecordShape::detect(&nested), RecordShape::Nested);
    assert_eq!(
        RecordShape::detect(&nested_formatted),
        RecordShape::NestedFormatted
    );

    let expected = Listing {
        identity_url: Some("https://www.autotrader.ca/a/honda/civic/london/ontario/5_1".into()),
        title: Some("2020 Honda Civic".into()),
        price_display: Some("$24,500".into()),
        city: Some("London".into()),
        mileage_km: Some(41_000),
        image_url: Some("https://img.autotrader.ca/1.jpg".into()),
        year: Some(2020),
        make: Some("Honda".into()),
        model: Some("Civic".into()),
    };
    assert_eq!(normalize(&flat), expected);
    assert_eq!(normalize(&nested), expected);
    assert_eq!(normalize(&nested_formatted), expected);
}

#[test]
fn flat_and_vehicle_nested_titles_match() {
    let flat = json!({"make": "Honda", "model": "Civic", "modelYear": 2020});
    let nested = json!({"vehicle": {"make": "Honda", "model": "Civic", "modelYear": 2020}});
    assert_eq!(normalize(&flat).title.as_deref(), Some("2020 Honda Civic"));
    assert_eq!(normalize(&nested).title.as_deref(), Some("2020 Honda Civic"));
}

#[test]
fn nested_price_keeps_top_level_vehicle_fields() {
    let nested_price = json!({
        "make": "Ford", "model": "F150", "year": 2019,
        "price": {"amount": 30000}, "url": "/x"
    });
    let flat = json!({
        "make": "Ford", "model": "F150", "year": 2019,
        "price": "$30,000", "url": "/x"
    });

    assert_eq!(RecordShape::detect(&nested_price), RecordShape::Nested);
    assert_eq!(normalize(&nested_price), normalize(&flat));
    assert_eq!(
        normalize(&nested_price).title.as_deref(),
        Some("2019 Ford F150")
    );
}

#[test]
fn null_vehicle_falls_back_to_top_level_fields() {
    let record = json!({
        "vehicle": null, "make": "Ford", "model": "F150", "modelYear": 2019, "url": "/x"
    });

    let listing = normalize(&record);
    assert_eq!(listing.make.as_deref(), Some("Ford"));
    assert_eq!(listing.model.as_deref(), Some("F150"));
    assert_eq!(listing.year, Some(2019));
    assert_eq!(listing.title.as_deref(), Some("2019 Ford F150"));
}

#[test]
fn vehicle_fields_win_over_top_level_ones() {
    let record = json!({
        "vehicle": {"make": "Honda", "model": "Civic", "modelYear": 2020},
        "make": "Ford", "model": "F150", "year": 2019
    });

    assert_eq!(normalize(&record).title.as_deref(), Some("2020 Honda Civic"));
}

// -----------------------------------------------------------------------
// field mapping
// -----------------------------------------------------------------------

#[test]
fn rest_channel_record_maps_to_listing() {
    let record = json!({
        "title": "2019 Ford F150",
        "price": "$30,000",
        "location": "London",
        "mileage": 50000,
        "url": "/x"
    });
    let listing = normalize(&record);
    assert_eq!(
        listing,
        Listing {
            identity_url: Some("https://www.autotrader.ca/x".into()),
            title: Some("2019 Ford F150".into()),
            price_display: Some("$30,000".into()),
            city: Some("London".into()),
            mileage_km: Some(50_000),
            ..Listing::default()
        }
    );
}

#[test]
fn supplied_title_wins_over_synthesis() {
    let record = json!({"title": "Clean Carfax!", "year": 2018, "make": "Mazda", "model": "3"});
    assert_eq!(normalize(&record).title.as_deref(), Some("Clean Carfax!"));
}

#[test]
fn title_synthesis_omits_missing_parts() {
    let record = json!({"make": "Tesla", "model": "", "year": null});
    assert_eq!(normalize(&record).title.as_deref(), Some("Tesla"));
}

#[test]
fn numeric_model_is_kept_as_text() {
    let record = json!({"year": 2018, "make": "Mazda", "model": 3});
    let listing = normalize(&record);
    assert_eq!(listing.model.as_deref(), Some("3"));
    assert_eq!(listing.title.as_deref(), Some("2018 Mazda 3"));
}

#[test]
fn numeric_price_gets_display_formatting() {
    let record = json!({"vehicle": {}, "price": {"amount": 1_234_567}});
    assert_eq!(
        normalize(&record).price_display.as_deref(),
        Some("$1,234,567")
    );
    let cents = json!({"vehicle": {}, "price": {"value": 999.5}});
    assert_eq!(normalize(&cents).price_display.as_deref(), Some("$999.50"));
}

#[test]
fn nested_record_with_flat_price_and_location_strings() {
    let record = json!({"vehicle": {"make": "Kia"}, "price": "$9,999", "location": "Sarnia"});
    let listing = normalize(&record);
    assert_eq!(listing.price_display.as_deref(), Some("$9,999"));
    assert_eq!(listing.city.as_deref(), Some("Sarnia"));
}

#[test]
fn first_image_is_chosen_over_image_url() {
    let record = json!({
        "images": ["/photos/a.jpg", "/photos/b.jpg"],
        "imageUrl": "https://img.autotrader.ca/other.jpg"
    });
    assert_eq!(
        normalize(&record).image_url.as_deref(),
        Some("https://www.autotrader.ca/photos/a.jpg")
    );
}

#[test]
fn empty_image_list_falls_back_to_image_url() {
    let record = json!({"images": [], "imageUrl": "https://img.autotrader.ca/only.jpg"});
    assert_eq!(
        normalize(&record).image_url.as_deref(),
        Some("https://img.autotrader.ca/only.jpg")
    );
}

#[test]
fn negative_and_garbage_mileage_is_absent() {
    assert!(normalize(&json!({"mileage": -10})).mileage_km.is_none());
    assert!(normalize(&json!({"mileage": "call for details"}))
        .mileage_km
        .is_none());
}

// -----------------------------------------------------------------------
// partial and malformed input
// -----------------------------------------------------------------------

#[test]
fn empty_object_normalizes_to_all_none() {
    assert_eq!(normalize(&json!({})), Listing::default());
}

#[test]
fn wrongly_typed_sub_objects_read_as_empty() {
    let record = json!({
        "vehicle": ["not", "an", "object"],
        "price": {"amount": "n/a"},
        "location": ["London", "ON"],
        "url": "/x"
    });
    let listing = normalize(&record);
    assert_eq!(
        listing.identity_url.as_deref(),
        Some("https://www.autotrader.ca/x")
    );
    assert!(listing.make.is_none());
    assert!(listing.city.is_none());
    assert_eq!(listing.price_display.as_deref(), Some("n/a"));
}

#[test]
fn absent_fields_stay_none_not_empty() {
    let listing = normalize(&json!({"title": "  ", "price": "", "url": ""}));
    assert!(listing.title.is_none());
    assert!(listing.price_display.is_none());
    assert!(listing.identity_url.is_none());
}

#[test]
fn array_record_is_a_normalization_error() {
    let err = normalize_listing(&json!([1, 2]), RecordShape::Flat, ORIGIN).unwrap_err();
    assert_eq!(err.found, "an array");
}

#[test]
fn string_record_is_a_normalization_error() {
    let record = json!("2019 Ford F150");
    let err = normalize_listing(&record, RecordShape::detect(&record), ORIGIN).unwrap_err();
    assert_eq!(err.found, "a string");
}

// -----------------------------------------------------------------------
// absolutize_url
// -----------------------------------------------------------------------

#[test]
fn relative_url_gets_site_origin() {
    assert_eq!(
        absolutize_url("/cars/123", ORIGIN).as_deref(),
        Some("https://www.autotrader.ca/cars/123")
    );
}

#[test]
fn relative_url_without_leading_slash_gets_separator() {
    assert_eq!(
        absolutize_url("cars/123", "https://www.autotrader.ca/").as_deref(),
        Some("https://www.autotrader.ca/cars/123")
    );
}

#[test]
fn absolute_url_is_unchanged() {
    let url = "https://www.autotrader.ca/a/ford/f150/1?rcp=15";
    assert_eq!(absolutize_url(url, ORIGIN).as_deref(), Some(url));
    assert_eq!(
        absolutize_url("http://example.com/x", ORIGIN).as_deref(),
        Some("http://example.com/x")
    );
}

#[test]
fn protocol_relative_url_borrows_origin_scheme() {
    assert_eq!(
        absolutize_url("//img.autotrader.ca/1.jpg", ORIGIN).as_deref(),
        Some("https://img.autotrader.ca/1.jpg")
    );
}

#[test]
fn blank_url_is_none() {
    assert!(absolutize_url("   ", ORIGIN).is_none());
}
