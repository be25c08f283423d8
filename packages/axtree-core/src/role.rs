#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Semantic role of a node.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Role {
    #[default]
    Unknown,
    Alert,
    Article,
    Banner,
    Button,
    Cell,
    CheckBox,
    Column,
    ColumnHeader,
    ComboBox,
    Comment,
    DescriptionList,
    Dialog,
    Directory,
    Document,
    Feed,
    Figure,
    GenericContainer,
    Grid,
    GridCell,
    Group,
    Heading,
    Image,
    InlineTextBox,
    LayoutTable,
    LayoutTableCell,
    LayoutTableRow,
    Link,
    List,
    ListBox,
    ListBoxOption,
    ListItem,
    ListMarker,
    Main,
    Menu,
    MenuBar,
    MenuItem,
    MenuItemCheckBox,
    MenuItemRadio,
    MenuListOption,
    MenuListPopup,
    Navigation,
    None,
    Paragraph,
    PopUpButton,
    RadioButton,
    RadioGroup,
    Region,
    RootWebArea,
    Row,
    RowGroup,
    RowHeader,
    Section,
    Slider,
    StaticText,
    Switch,
    Tab,
    TabList,
    TabPanel,
    Table,
    TableHeaderContainer,
    TextField,
    Toolbar,
    Tree,
    TreeGrid,
    TreeItem,
    Window,
}

impl Role {
    /// Roles treated as structure-free wrappers when looking for an
    /// enclosing ordered set or table.
    pub fn is_generic_container(self) -> bool {
        matches!(
            self,
            Role::GenericContainer | Role::None | Role::Section | Role::Unknown
        )
    }

    pub fn is_table_like(self) -> bool {
        matches!(
            self,
            Role::Table | Role::Grid | Role::TreeGrid | Role::LayoutTable
        )
    }

    pub fn is_table_row(self) -> bool {
        matches!(self, Role::Row | Role::LayoutTableRow)
    }

    pub fn is_cell_or_table_header(self) -> bool {
        matches!(
            self,
            Role::Cell
                | Role::GridCell
                | Role::LayoutTableCell
                | Role::ColumnHeader
                | Role::RowHeader
        )
    }

    /// Containers whose rows are reached through when walking a table.
    pub fn is_row_container(self) -> bool {
        matches!(self, Role::RowGroup) || self.is_generic_container()
    }

    /// Roles that form an ordered set for the items nested inside them.
    pub fn is_set_like(self) -> bool {
        matches!(
            self,
            Role::DescriptionList
                | Role::Directory
                | Role::Feed
                | Role::Group
                | Role::List
                | Role::ListBox
                | Role::Menu
                | Role::MenuBar
                | Role::MenuListPopup
                | Role::PopUpButton
                | Role::RadioGroup
                | Role::TabList
                | Role::Tree
                | Role::TreeGrid
        )
    }

    /// Family used when counting siblings in an ordered set; roles in the
    /// same family are numbered together.
    pub fn item_family(self) -> Option<ItemFamily> {
        match self {
            Role::ListItem => Some(ItemFamily::ListItem),
            Role::ListBoxOption | Role::MenuListOption => Some(ItemFamily::Option),
            Role::MenuItem | Role::MenuItemCheckBox | Role::MenuItemRadio => {
                Some(ItemFamily::MenuItem)
            }
            Role::RadioButton => Some(ItemFamily::RadioButton),
            Role::Tab => Some(ItemFamily::Tab),
            Role::TreeItem => Some(ItemFamily::TreeItem),
            Role::Article => Some(ItemFamily::Article),
            Role::Comment => Some(ItemFamily::Comment),
            _ => None,
        }
    }

    /// Whether an item of `family` may be numbered within a set of this role.
    pub fn accepts_items(self, family: ItemFamily) -> bool {
        match self {
            Role::List | Role::DescriptionList | Role::Directory => {
                family == ItemFamily::ListItem
            }
            Role::ListBox | Role::MenuListPopup | Role::PopUpButton => {
                matches!(family, ItemFamily::Option | ItemFamily::MenuItem)
            }
            Role::Menu | Role::MenuBar => family == ItemFamily::MenuItem,
            Role::RadioGroup => family == ItemFamily::RadioButton,
            Role::TabList => family == ItemFamily::Tab,
            Role::Tree | Role::TreeGrid => family == ItemFamily::TreeItem,
            Role::Feed => family == ItemFamily::Article,
            Role::Group => true,
            _ => false,
        }
    }
}

/// Groups of item roles that share one numbering sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ItemFamily {
    Article,
    Comment,
    ListItem,
    MenuItem,
    Option,
    RadioButton,
    Tab,
    TreeItem,
}

/// Boolean states stored as a bit set on [`NodeData`](crate::NodeData).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum State {
    Collapsed,
    Default,
    Editable,
    Expanded,
    Focusable,
    Horizontal,
    Hovered,
    Ignored,
    Invisible,
    Linked,
    Multiline,
    Multiselectable,
    Protected,
    Required,
    RichlyEditable,
    Vertical,
    Visited,
}

impl State {
    pub const ALL: [State; 17] = [
        State::Collapsed,
        State::Default,
        State::Editable,
        State::Expanded,
        State::Focusable,
        State::Horizontal,
        State::Hovered,
        State::Ignored,
        State::Invisible,
        State::Linked,
        State::Multiline,
        State::Multiselectable,
        State::Protected,
        State::Required,
        State::RichlyEditable,
        State::Vertical,
        State::Visited,
    ];

    pub(crate) fn bit(self) -> u32 {
        1 << (self as u8)
    }
}
