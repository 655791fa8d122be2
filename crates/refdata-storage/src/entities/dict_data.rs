use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sys_dict_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub label: String,
    pub value: String,
    pub sort_order: i32,
    pub type_id: i64,
    /// 冗余的类型编码，只由存储层写入
    pub type_code: String,
    pub is_default: bool,
    pub status: String,
    pub remark: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dict_type::Entity",
        from = "Column::TypeId",
        to = "super::dict_type::Column::Id",
        on_delete = "Cascade"
    )]
    DictType,
}

impl Related<super::dict_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DictType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
