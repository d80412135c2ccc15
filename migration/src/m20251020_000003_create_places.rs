use sea_orm_migration::prelude::extension::postgres::{Type, TypeCreateStatement};
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Places {
    Table,
    Id,
    Name,
    Type,
    City,
    Location,
    Region,
    Address,
    Latitude,
    Longitude,
    Phone,
    Website,
    GoogleMapsUrl,
    Image,
    Rating,
    RatingCount,
    Price,
    PriceTier,
    Description,
    Tags,
    IsHot,
    Exclusive,
    BookingType,
    Vibe,
    EventLineup,
    MusicGenre,
    PartyType,
    DressCode,
    IsSponsored,
    SponsorName,
    AdUrl,
    OpeningHoursJson,
    HasVip,
    VipMinSpend,
    VipContactName,
    VipContactPhone,
    VipContactEmail,
    VipNotes,
    CreatedAt,
    UpdatedAt,
}

fn enum_type(name: &str, values: &[&str]) -> TypeCreateStatement {
    Type::create()
        .as_enum(Alias::new(name))
        .values(values.iter().map(|v| Alias::new(*v)))
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(enum_type(
                "place_type",
                &["restaurant", "nightlife", "hotel", "event"],
            ))
            .await?;
        manager
            .create_type(enum_type("city_type", &["Montreal", "Quebec City", "Other"]))
            .await?;
        manager
            .create_type(enum_type(
                "booking_type",
                &["reservation", "ticket", "guestlist", "none"],
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Places::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Places::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Places::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Places::Type)
                            .custom(Alias::new("place_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Places::City)
                            .custom(Alias::new("city_type"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Places::Location).string_len(200).not_null())
                    .col(ColumnDef::new(Places::Region).string_len(200).null())
                    .col(ColumnDef::new(Places::Address).text().null())
                    .col(ColumnDef::new(Places::Latitude).double().null())
                    .col(ColumnDef::new(Places::Longitude).double().null())
                    .col(ColumnDef::new(Places::Phone).string_len(50).null())
                    .col(ColumnDef::new(Places::Website).text().null())
                    .col(ColumnDef::new(Places::GoogleMapsUrl).text().null())
                    .col(ColumnDef::new(Places::Image).text().not_null())
                    .col(
                        ColumnDef::new(Places::Rating)
                            .double()
                            .not_null()
                            .default(0.0)
                            .check(Expr::col(Places::Rating).between(0.0, 5.0)),
                    )
                    .col(
                        ColumnDef::new(Places::RatingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Places::Price).string_len(50).null())
                    .col(ColumnDef::new(Places::PriceTier).string_len(8).null())
                    .col(ColumnDef::new(Places::Description).text().not_null())
                    .col(
                        ColumnDef::new(Places::Tags)
                            .array(ColumnType::Text)
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(
                        ColumnDef::new(Places::IsHot)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Places::Exclusive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Places::BookingType)
                            .custom(Alias::new("booking_type"))
                            .not_null()
                            .default(Expr::cust("'none'")),
                    )
                    .col(ColumnDef::new(Places::Vibe).string_len(200).null())
                    .col(ColumnDef::new(Places::EventLineup).array(ColumnType::Text).null())
                    .col(ColumnDef::new(Places::MusicGenre).string_len(100).null())
                    .col(ColumnDef::new(Places::PartyType).string_len(100).null())
                    .col(ColumnDef::new(Places::DressCode).string_len(100).null())
                    .col(
                        ColumnDef::new(Places::IsSponsored)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Places::SponsorName).string_len(200).null())
                    .col(ColumnDef::new(Places::AdUrl).text().null())
                    .col(ColumnDef::new(Places::OpeningHoursJson).json_binary().null())
                    .col(
                        ColumnDef::new(Places::HasVip)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Places::VipMinSpend).double().null())
                    .col(ColumnDef::new(Places::VipContactName).string_len(200).null())
                    .col(ColumnDef::new(Places::VipContactPhone).string_len(50).null())
                    .col(ColumnDef::new(Places::VipContactEmail).string_len(320).null())
                    .col(ColumnDef::new(Places::VipNotes).text().null())
                    .col(
                        ColumnDef::new(Places::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Places::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_places_city_type")
                    .table(Places::Table)
                    .col(Places::City)
                    .col(Places::Type)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_places_hot_rating")
                    .table(Places::Table)
                    .col(Places::IsHot)
                    .col(Places::Rating)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Places::Table).to_owned())
            .await?;
        for name in ["booking_type", "city_type", "place_type"] {
            manager
                .drop_type(Type::drop().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
