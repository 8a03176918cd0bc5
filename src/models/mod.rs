// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table (PostgreSQL en prod) avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Comptes (admin = is_superuser)
//   - parent : Profil parent (1:1 avec users), tuteur des élèves
//   - driver : Profil chauffeur (1:1 avec users)
//   - student : Élèves, identifiés par leur badge RFID
//   - bus : Bus et dernière position connue
//   - route : Trajets (départ/arrivée), au plus un bus par trajet
//   - boarding_history : Journal des montées/descentes (ajout seul)
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les relations entre tables sont définies dans chaque modèle
//   - Les tables sont créées par db::create_schema à partir des entités
//
// ============================================================================

pub mod health;
pub mod users;
pub mod parent;
pub mod driver;
pub mod student;
pub mod bus;
pub mod route;
pub mod boarding_history;
pub mod dto;
