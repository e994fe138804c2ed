//! First-run sample data

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{
        book::CreateBook,
        enums::MembershipType,
        member::CreateMember,
    },
    repository::Repository,
};

fn sample_books() -> Vec<CreateBook> {
    vec![
        CreateBook {
            title: "The Great Gatsby".to_string(),
            author: "F. Scott Fitzgerald".to_string(),
            isbn: "978-0-7432-7356-5".to_string(),
            category: "Fiction".to_string(),
            published_year: Some(1925),
            description: Some("A classic American novel set in the Jazz Age".to_string()),
            cover_url: None,
            total_copies: 5,
        },
        CreateBook {
            title: "To Kill a Mockingbird".to_string(),
            author: "Harper Lee".to_string(),
            isbn: "978-0-06-112008-4".to_string(),
            category: "Fiction".to_string(),
            published_year: Some(1960),
            description: Some("A gripping tale of racial injustice and childhood innocence".to_string()),
            cover_url: None,
            total_copies: 4,
        },
        CreateBook {
            title: "1984".to_string(),
            author: "George Orwell".to_string(),
            isbn: "978-0-452-28423-4".to_string(),
            category: "Science Fiction".to_string(),
            published_year: Some(1949),
            description: Some("A dystopian social science fiction novel".to_string()),
            cover_url: None,
            total_copies: 6,
        },
    ]
}

fn sample_members() -> Vec<CreateMember> {
    vec![
        CreateMember {
            name: "John Doe".to_string(),
            email: "john.doe@email.com".to_string(),
            phone: Some("+1-555-0123".to_string()),
            address: Some("123 Main St, City, State 12345".to_string()),
            membership_type: MembershipType::Student,
            join_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            is_active: Some(true),
        },
        CreateMember {
            name: "Jane Smith".to_string(),
            email: "jane.smith@email.com".to_string(),
            phone: Some("+1-555-0456".to_string()),
            address: Some("456 Oak Ave, City, State 12345".to_string()),
            membership_type: MembershipType::Faculty,
            join_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            is_active: Some(true),
        },
    ]
}

/// Populate empty collections with sample books and members.
/// Returns `false` when both already had records.
pub async fn seed_sample_data(repository: &Repository) -> AppResult<bool> {
    let mut seeded = false;

    if repository.books.count().await? == 0 {
        for book in sample_books() {
            repository.books.create(&book).await?;
        }
        tracing::info!("Seeded sample catalog");
        seeded = true;
    }

    if repository.members.count().await? == 0 {
        for member in sample_members() {
            repository.members.create(&member).await?;
        }
        tracing::info!("Seeded sample members");
        seeded = true;
    }

    Ok(seeded)
}
