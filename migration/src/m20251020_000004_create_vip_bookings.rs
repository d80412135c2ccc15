use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum VipBookings {
    Table,
    Id,
    PlaceId,
    UserId,
    UserEmail,
    UserName,
    BookingType,
    BookingDate,
    BookingTime,
    PartySize,
    Status,
    SpecialRequest,
    ConfirmationCode,
    TableNumber,
    MinimumSpend,
    SponsorName,
    CreatedAt,
    UpdatedAt,
    ConfirmedAt,
    CancelledAt,
}

#[derive(DeriveIden)]
enum Places {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("vip_booking_type"))
                    .values(vec![
                        Alias::new("guestlist"),
                        Alias::new("vip"),
                        Alias::new("event"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("booking_status"))
                    .values(vec![
                        Alias::new("pending"),
                        Alias::new("confirmed"),
                        Alias::new("cancelled"),
                        Alias::new("completed"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VipBookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VipBookings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VipBookings::PlaceId).uuid().not_null())
                    .col(ColumnDef::new(VipBookings::UserId).string_len(100).null())
                    .col(ColumnDef::new(VipBookings::UserEmail).string_len(320).null())
                    .col(
                        ColumnDef::new(VipBookings::UserName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VipBookings::BookingType)
                            .custom(Alias::new("vip_booking_type"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(VipBookings::BookingDate).date().not_null())
                    .col(ColumnDef::new(VipBookings::BookingTime).string_len(5).null())
                    .col(
                        ColumnDef::new(VipBookings::PartySize)
                            .integer()
                            .not_null()
                            .check(Expr::col(VipBookings::PartySize).gt(0)),
                    )
                    .col(
                        ColumnDef::new(VipBookings::Status)
                            .custom(Alias::new("booking_status"))
                            .not_null()
                            .default(Expr::cust("'pending'")),
                    )
                    .col(ColumnDef::new(VipBookings::SpecialRequest).text().null())
                    .col(
                        ColumnDef::new(VipBookings::ConfirmationCode)
                            .string_len(16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(VipBookings::TableNumber).string_len(20).null())
                    .col(ColumnDef::new(VipBookings::MinimumSpend).double().null())
                    .col(ColumnDef::new(VipBookings::SponsorName).string_len(200).null())
                    .col(
                        ColumnDef::new(VipBookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(VipBookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(VipBookings::ConfirmedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VipBookings::CancelledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vip_bookings_place")
                            .from(VipBookings::Table, VipBookings::PlaceId)
                            .to(Places::Table, Places::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vip_bookings_place_date")
                    .table(VipBookings::Table)
                    .col(VipBookings::PlaceId)
                    .col(VipBookings::BookingDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vip_bookings_user_email")
                    .table(VipBookings::Table)
                    .col(VipBookings::UserEmail)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(VipBookings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("booking_status")).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("vip_booking_type")).to_owned())
            .await?;
        Ok(())
    }
}
