use customer_extract::{count_rows, get_all_rows, run, OutputFormat, PipelineConfig};
use rusqlite::Connection;
use std::fs;
use tempfile::tempdir;

const CUSTOMERS: &str = r#"[
    {
        "id": 2,
        "name": "Bob",
        "registration_date": "2021-07-15",
        "orders": [
            {
                "order_id": 200,
                "order_date": "2021-08-01",
                "items": [
                    {"item_id": 5, "product_name": "T-Shirt", "category": 2, "price": "$10.00", "quantity": 2},
                    {"item_id": 3, "product_name": "Mystery", "category": 99, "price": "5.00", "quantity": 1},
                    {"item_id": 4, "product_name": "Broken", "category": 1, "price": "ten", "quantity": 1}
                ]
            },
            {
                "order_id": "oops",
                "order_date": "2021-08-02",
                "items": [
                    {"item_id": 1, "product_name": "Never", "category": 1, "price": "1", "quantity": 1}
                ]
            }
        ]
    },
    {
        "id": "1",
        "name": "Alice",
        "registration_date": "2020-01-01",
        "orders": [
            {
                "order_id": 100,
                "order_date": "2020-03-04",
                "items": [
                    {"item_id": 7, "product_name": "Laptop", "category": 1, "price": "$1,234.50", "quantity": 1}
                ]
            }
        ]
    },
    {
        "id": 3,
        "name": "Carol",
        "registration_date": "yesterday-ish",
        "orders": [
            {
                "order_id": 300,
                "order_date": "2021-01-01",
                "items": [
                    {"item_id": 1, "product_name": "Lamp", "category": 4, "price": "20", "quantity": 1}
                ]
            }
        ]
    }
]"#;

fn write_inputs(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let customers = dir.join("customer_orders.json");
    let vip = dir.join("vip_customers.txt");
    fs::write(&customers, CUSTOMERS).unwrap();
    fs::write(&vip, "2\n\n42\n").unwrap();
    (customers, vip)
}

#[test]
fn test_csv_end_to_end() {
    let dir = tempdir().unwrap();
    let (customers_path, vip_path) = write_inputs(dir.path());
    let output_path = dir.path().join("cleaned_customer_orders.csv");

    let report = run(&PipelineConfig {
        customers_path,
        vip_path,
        output_path: output_path.clone(),
        format: OutputFormat::Csv,
    })
    .unwrap();

    assert_eq!(report.rows_emitted, 3);
    assert_eq!(report.customers_skipped, 1);
    assert_eq!(report.orders_skipped, 1);
    assert_eq!(report.items_skipped, 1);

    let out = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("customer_id,customer_name,registration_date,is_vip,"));
    assert_eq!(
        lines[1],
        "1,Alice,2020-01-01,False,100,2020-03-04,7,Laptop,Electronics,1234.5,1,1234.5,1.0"
    );
    assert_eq!(
        lines[2],
        "2,Bob,2021-07-15,True,200,2021-08-01,3,Mystery,Misc,5.0,1,5.0,0.2"
    );
    assert_eq!(
        lines[3],
        "2,Bob,2021-07-15,True,200,2021-08-01,5,T-Shirt,Apparel,10.0,2,20.0,0.8"
    );
}

#[test]
fn test_sqlite_end_to_end() {
    let dir = tempdir().unwrap();
    let (customers_path, vip_path) = write_inputs(dir.path());
    let output_path = dir.path().join("cleaned_customer_orders.db");

    run(&PipelineConfig {
        customers_path,
        vip_path,
        output_path: output_path.clone(),
        format: OutputFormat::Sqlite,
    })
    .unwrap();

    let conn = Connection::open(&output_path).unwrap();
    assert_eq!(count_rows(&conn).unwrap(), 3);

    let rows = get_all_rows(&conn).unwrap();
    let keys: Vec<_> = rows.iter().map(|r| r.sort_key()).collect();
    assert_eq!(keys, vec![(1, 100, 7), (2, 200, 3), (2, 200, 5)]);
    assert!(rows[1].is_vip);
    assert_eq!(rows[2].category, "Apparel");
}

#[test]
fn test_bad_vip_file_is_fatal() {
    let dir = tempdir().unwrap();
    let (customers_path, vip_path) = write_inputs(dir.path());
    fs::write(&vip_path, "1\nnot-a-number\n").unwrap();

    let result = run(&PipelineConfig {
        customers_path,
        vip_path,
        output_path: dir.path().join("out.csv"),
        format: OutputFormat::Csv,
    });

    assert!(result.is_err());
}

#[test]
fn test_all_customers_invalid_still_writes_header() {
    let dir = tempdir().unwrap();
    let customers_path = dir.path().join("customers.json");
    let vip_path = dir.path().join("vip.txt");
    let output_path = dir.path().join("out.csv");
    fs::write(&customers_path, r#"[{"id": 1, "name": "x", "registration_date": null}]"#).unwrap();
    fs::write(&vip_path, "").unwrap();

    let report = run(&PipelineConfig {
        customers_path,
        vip_path,
        output_path: output_path.clone(),
        format: OutputFormat::Csv,
    })
    .unwrap();

    assert_eq!(report.rows_emitted, 0);
    let out = fs::read_to_string(&output_path).unwrap();
    assert_eq!(out.lines().count(), 1);
}
